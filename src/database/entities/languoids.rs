use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "languoids")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_languoid_links::Entity")]
    ProjectLanguoidLinks,
    #[sea_orm(has_many = "super::asset_content_links::Entity")]
    AssetContentLinks,
}

impl Related<super::project_languoid_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectLanguoidLinks.def()
    }
}

impl Related<super::asset_content_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssetContentLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
