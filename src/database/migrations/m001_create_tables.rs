use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create profiles table
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profiles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profiles::Username).string().not_null())
                    .col(ColumnDef::new(Profiles::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create languoids table
        manager
            .create_table(
                Table::create()
                    .table(Languoids::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Languoids::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Languoids::Name).string().not_null())
                    .col(ColumnDef::new(Languoids::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create projects table
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(ColumnDef::new(Projects::Description).string())
                    .col(ColumnDef::new(Projects::CreatorId).integer().not_null())
                    .col(ColumnDef::new(Projects::TargetLanguoidId).integer())
                    .col(ColumnDef::new(Projects::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Projects::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_creator_id")
                            .from(Projects::Table, Projects::CreatorId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Concurrent imports naming the same project resolve via
        // catch-and-refetch against this constraint.
        manager
            .create_index(
                Index::create()
                    .name("idx_projects_name_creator")
                    .table(Projects::Table)
                    .col(Projects::Name)
                    .col(Projects::CreatorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create profile_project_links table
        manager
            .create_table(
                Table::create()
                    .table(ProfileProjectLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProfileProjectLinks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProfileProjectLinks::ProfileId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProfileProjectLinks::ProjectId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProfileProjectLinks::Membership)
                            .string()
                            .not_null()
                            .default("owner"),
                    )
                    .col(
                        ColumnDef::new(ProfileProjectLinks::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profile_project_links_profile_id")
                            .from(ProfileProjectLinks::Table, ProfileProjectLinks::ProfileId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profile_project_links_project_id")
                            .from(ProfileProjectLinks::Table, ProfileProjectLinks::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create project_languoid_links table
        manager
            .create_table(
                Table::create()
                    .table(ProjectLanguoidLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectLanguoidLinks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectLanguoidLinks::ProjectId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectLanguoidLinks::LanguoidId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectLanguoidLinks::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_languoid_links_project_id")
                            .from(ProjectLanguoidLinks::Table, ProjectLanguoidLinks::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_languoid_links_languoid_id")
                            .from(ProjectLanguoidLinks::Table, ProjectLanguoidLinks::LanguoidId)
                            .to(Languoids::Table, Languoids::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create quests table
        manager
            .create_table(
                Table::create()
                    .table(Quests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Quests::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Quests::Name).string().not_null())
                    .col(ColumnDef::new(Quests::Description).string())
                    .col(ColumnDef::new(Quests::ProjectId).integer().not_null())
                    .col(ColumnDef::new(Quests::ParentQuestId).integer())
                    .col(ColumnDef::new(Quests::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Quests::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quests_project_id")
                            .from(Quests::Table, Quests::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quests_parent_quest_id")
                            .from(Quests::Table, Quests::ParentQuestId)
                            .to(Quests::Table, Quests::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Not unique: same-named quests under different parents are
        // legal within one project.
        manager
            .create_index(
                Index::create()
                    .name("idx_quests_project_name")
                    .table(Quests::Table)
                    .col(Quests::ProjectId)
                    .col(Quests::Name)
                    .to_owned(),
            )
            .await?;

        // Create assets table
        manager
            .create_table(
                Table::create()
                    .table(Assets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Assets::Name).string().not_null())
                    .col(ColumnDef::new(Assets::CreatorId).integer().not_null())
                    .col(ColumnDef::new(Assets::ProjectId).integer().not_null())
                    .col(
                        ColumnDef::new(Assets::Visible)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Assets::Images).text())
                    .col(ColumnDef::new(Assets::SourceAssetId).integer())
                    .col(ColumnDef::new(Assets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Assets::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assets_project_id")
                            .from(Assets::Table, Assets::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assets_creator_id")
                            .from(Assets::Table, Assets::CreatorId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assets_source_asset_id")
                            .from(Assets::Table, Assets::SourceAssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create quest_asset_links table
        manager
            .create_table(
                Table::create()
                    .table(QuestAssetLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestAssetLinks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QuestAssetLinks::QuestId).integer().not_null())
                    .col(ColumnDef::new(QuestAssetLinks::AssetId).integer().not_null())
                    .col(
                        ColumnDef::new(QuestAssetLinks::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quest_asset_links_quest_id")
                            .from(QuestAssetLinks::Table, QuestAssetLinks::QuestId)
                            .to(Quests::Table, Quests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quest_asset_links_asset_id")
                            .from(QuestAssetLinks::Table, QuestAssetLinks::AssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create asset_content_links table
        manager
            .create_table(
                Table::create()
                    .table(AssetContentLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssetContentLinks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AssetContentLinks::AssetId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssetContentLinks::Text)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(AssetContentLinks::Audio).text())
                    .col(ColumnDef::new(AssetContentLinks::LanguoidId).integer())
                    .col(
                        ColumnDef::new(AssetContentLinks::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_content_links_asset_id")
                            .from(AssetContentLinks::Table, AssetContentLinks::AssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_content_links_languoid_id")
                            .from(AssetContentLinks::Table, AssetContentLinks::LanguoidId)
                            .to(Languoids::Table, Languoids::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create tags table
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tags::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tags::Key).string().not_null())
                    .col(ColumnDef::new(Tags::Value).string().not_null().default(""))
                    .col(ColumnDef::new(Tags::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tags_key_value")
                    .table(Tags::Table)
                    .col(Tags::Key)
                    .col(Tags::Value)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create asset_tag_links table
        manager
            .create_table(
                Table::create()
                    .table(AssetTagLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssetTagLinks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AssetTagLinks::AssetId).integer().not_null())
                    .col(ColumnDef::new(AssetTagLinks::TagId).integer().not_null())
                    .col(
                        ColumnDef::new(AssetTagLinks::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_tag_links_asset_id")
                            .from(AssetTagLinks::Table, AssetTagLinks::AssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_tag_links_tag_id")
                            .from(AssetTagLinks::Table, AssetTagLinks::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create quest_tag_links table
        manager
            .create_table(
                Table::create()
                    .table(QuestTagLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestTagLinks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QuestTagLinks::QuestId).integer().not_null())
                    .col(ColumnDef::new(QuestTagLinks::TagId).integer().not_null())
                    .col(
                        ColumnDef::new(QuestTagLinks::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quest_tag_links_quest_id")
                            .from(QuestTagLinks::Table, QuestTagLinks::QuestId)
                            .to(Quests::Table, Quests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quest_tag_links_tag_id")
                            .from(QuestTagLinks::Table, QuestTagLinks::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuestTagLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssetTagLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssetContentLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QuestAssetLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Quests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectLanguoidLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProfileProjectLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Languoids::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    Username,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Languoids {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Name,
    Description,
    CreatorId,
    TargetLanguoidId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProfileProjectLinks {
    Table,
    Id,
    ProfileId,
    ProjectId,
    Membership,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ProjectLanguoidLinks {
    Table,
    Id,
    ProjectId,
    LanguoidId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Quests {
    Table,
    Id,
    Name,
    Description,
    ProjectId,
    ParentQuestId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assets {
    Table,
    Id,
    Name,
    CreatorId,
    ProjectId,
    Visible,
    Images,
    SourceAssetId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum QuestAssetLinks {
    Table,
    Id,
    QuestId,
    AssetId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AssetContentLinks {
    Table,
    Id,
    AssetId,
    Text,
    Audio,
    LanguoidId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    Key,
    Value,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AssetTagLinks {
    Table,
    Id,
    AssetId,
    TagId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum QuestTagLinks {
    Table,
    Id,
    QuestId,
    TagId,
    CreatedAt,
}
