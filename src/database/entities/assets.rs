use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub creator_id: i32,
    pub project_id: i32,
    pub visible: bool,
    /// JSON array of storage keys, or null when the row carried no images.
    #[sea_orm(column_type = "Text", nullable)]
    pub images: Option<String>,
    /// Set when an asset is a translation of another; never written by the
    /// bulk import path.
    pub source_asset_id: Option<i32>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::CreatorId",
        to = "super::profiles::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::asset_content_links::Entity")]
    AssetContentLinks,
    #[sea_orm(has_many = "super::asset_tag_links::Entity")]
    AssetTagLinks,
    #[sea_orm(has_many = "super::quest_asset_links::Entity")]
    QuestAssetLinks,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::asset_content_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssetContentLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
