use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tags are deduplicated globally by `(key, value)`; legacy single-token
/// tags store an empty value.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub key: String,
    #[sea_orm(default_value = "")]
    pub value: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::asset_tag_links::Entity")]
    AssetTagLinks,
    #[sea_orm(has_many = "super::quest_tag_links::Entity")]
    QuestTagLinks,
}

impl Related<super::asset_tag_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssetTagLinks.def()
    }
}

impl Related<super::quest_tag_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuestTagLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
