use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One text+audio passage attached to an asset. An asset may carry several,
/// ordered by creation time and correlated positionally with the audio list
/// supplied in the same CSV row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset_content_links")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub asset_id: i32,
    #[sea_orm(column_type = "Text", default_value = "")]
    pub text: String,
    /// JSON array of audio storage keys, or null when no audio resolved.
    #[sea_orm(column_type = "Text", nullable)]
    pub audio: Option<String>,
    pub languoid_id: Option<i32>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assets::Entity",
        from = "Column::AssetId",
        to = "super::assets::Column::Id"
    )]
    Asset,
    #[sea_orm(
        belongs_to = "super::languoids::Entity",
        from = "Column::LanguoidId",
        to = "super::languoids::Column::Id"
    )]
    Languoid,
}

impl Related<super::assets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl Related<super::languoids::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Languoid.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
