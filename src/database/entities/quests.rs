use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub project_id: i32,
    /// Self-referential tree; linked in a second pass after all quests in a
    /// batch exist.
    pub parent_quest_id: Option<i32>,
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
        belongs_to = "Entity",
        from = "Column::ParentQuestId",
        to = "Column::Id"
    )]
    ParentQuest,
    #[sea_orm(has_many = "super::quest_asset_links::Entity")]
    QuestAssetLinks,
    #[sea_orm(has_many = "super::quest_tag_links::Entity")]
    QuestTagLinks,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::quest_asset_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuestAssetLinks.def()
    }
}

impl Related<super::quest_tag_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuestTagLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
