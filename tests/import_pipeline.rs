//! End-to-end bulk import tests
//!
//! Each test drives the full pipeline: a ZIP built in memory goes through
//! archive extraction, validation, media upload, and entity materialization
//! against an in-memory SQLite database.

use std::io::{Cursor, Write};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use zip::write::FileOptions;
use zip::ZipWriter;

use lingoquest::database::entities::*;
use lingoquest::database::setup_database;
use lingoquest::errors::ImportError;
use lingoquest::services::{ImportContext, ImportMode, ImportService, LanguageService};
use lingoquest::storage::MemoryObjectStore;

struct Harness {
    db: DatabaseConnection,
    service: ImportService,
}

async fn harness() -> Result<Harness> {
    let db = Database::connect("sqlite::memory:").await?;
    setup_database(&db).await?;
    let store = Arc::new(MemoryObjectStore::new());
    let service = ImportService::new(db.clone(), store);
    Ok(Harness { db, service })
}

fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn ctx(profile_id: i32) -> ImportContext {
    ImportContext {
        profile_id,
        project_id: None,
        quest_id: None,
    }
}

async fn seed_profile(db: &DatabaseConnection) -> Result<i32> {
    let profile = profiles::ActiveModel {
        username: Set("alice".to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(profile.id)
}

async fn seed_languoid(db: &DatabaseConnection, name: &str) -> Result<i32> {
    let languoid = languoids::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(languoid.id)
}

async fn seed_project(db: &DatabaseConnection, name: &str, creator_id: i32) -> Result<i32> {
    let now = Utc::now();
    let project = projects::ActiveModel {
        name: Set(name.to_string()),
        creator_id: Set(creator_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(project.id)
}

async fn seed_quest(db: &DatabaseConnection, project_id: i32, name: &str) -> Result<i32> {
    let now = Utc::now();
    let quest = quests::ActiveModel {
        name: Set(name.to_string()),
        project_id: Set(project_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(quest.id)
}

const PROJECT_CSV: &str = "\
project_name,target_language,quest_name,parent_quest_name,quest_tags,asset_name,asset_tags,source_content,source_images,source_audio,source_language
Luke,spanish,Ch1,,book:luke,Greeting,difficulty:easy,hola;adios,pic.png,a.mp3;b.mp3,english
Luke,spanish,Ch2,Ch1,,Farewell,,bye,,,english
";

fn project_zip() -> Vec<u8> {
    build_zip(&[
        ("data.csv", PROJECT_CSV.as_bytes()),
        ("media/pic.png", b"\x89PNG"),
        ("media/a.mp3", b"\x00a"),
        ("media/b.mp3", b"\x00b"),
    ])
}

#[tokio::test]
async fn test_project_import_creates_full_hierarchy() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;
    let spanish_id = seed_languoid(&h.db, "spanish").await?;
    seed_languoid(&h.db, "english").await?;

    let report = h
        .service
        .import(ImportMode::Project, project_zip(), ctx(profile_id))
        .await?;

    assert!(report.success(), "errors: {:?}", report.errors);
    assert_eq!(report.projects.created, 1);
    assert_eq!(report.quests.created, 2);
    assert_eq!(report.assets.created, 2);
    assert_eq!(report.content_links.created, 3);
    assert_eq!(report.tags.created, 2);

    let project = projects::Entity::find()
        .filter(projects::Column::Name.eq("Luke"))
        .one(&h.db)
        .await?
        .expect("project should exist");
    assert_eq!(project.creator_id, profile_id);
    assert_eq!(project.target_languoid_id, Some(spanish_id));

    // Importer becomes owner of the project it created
    let membership = profile_project_links::Entity::find()
        .filter(profile_project_links::Column::ProjectId.eq(project.id))
        .one(&h.db)
        .await?
        .expect("ownership link should exist");
    assert_eq!(membership.profile_id, profile_id);
    assert_eq!(membership.membership, "owner");

    let ch1 = quests::Entity::find()
        .filter(quests::Column::Name.eq("Ch1"))
        .one(&h.db)
        .await?
        .expect("quest Ch1 should exist");
    let ch2 = quests::Entity::find()
        .filter(quests::Column::Name.eq("Ch2"))
        .one(&h.db)
        .await?
        .expect("quest Ch2 should exist");
    assert_eq!(ch1.parent_quest_id, None);
    assert_eq!(ch2.parent_quest_id, Some(ch1.id));

    let greeting = assets::Entity::find()
        .filter(assets::Column::Name.eq("Greeting"))
        .one(&h.db)
        .await?
        .expect("asset should exist");
    let images = greeting.images.expect("image should have resolved");
    assert!(images.contains("images/"));
    assert!(images.ends_with(".png\"]"));

    let links = asset_content_links::Entity::find()
        .filter(asset_content_links::Column::AssetId.eq(greeting.id))
        .order_by_asc(asset_content_links::Column::Id)
        .all(&h.db)
        .await?;
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].text, "hola");
    assert_eq!(links[1].text, "adios");
    assert!(links[0].audio.as_deref().unwrap().contains("audio/"));
    assert!(links[1].audio.as_deref().unwrap().contains("audio/"));

    Ok(())
}

#[tokio::test]
async fn test_reimport_reuses_projects_quests_and_tags() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;
    seed_languoid(&h.db, "spanish").await?;
    seed_languoid(&h.db, "english").await?;

    let first = h
        .service
        .import(ImportMode::Project, project_zip(), ctx(profile_id))
        .await?;
    assert!(first.success());

    let second = h
        .service
        .import(ImportMode::Project, project_zip(), ctx(profile_id))
        .await?;
    assert!(second.success(), "errors: {:?}", second.errors);
    assert_eq!(second.projects.created, 0);
    assert_eq!(second.projects.read, 1);
    assert_eq!(second.quests.created, 0);
    assert_eq!(second.quests.read, 2);
    assert_eq!(second.tags.created, 0);

    // Assets are never deduplicated
    assert_eq!(second.assets.created, 2);
    let all_assets = assets::Entity::find().all(&h.db).await?;
    assert_eq!(all_assets.len(), 4);

    let all_projects = projects::Entity::find().all(&h.db).await?;
    assert_eq!(all_projects.len(), 1);
    let all_quests = quests::Entity::find().all(&h.db).await?;
    assert_eq!(all_quests.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_mode_mismatch_names_detected_mode() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;

    let err = h
        .service
        .import(ImportMode::Asset, project_zip(), ctx(profile_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::ModeMismatch(_)));
    assert!(err.to_string().contains("'project'"));

    // Nothing was created
    assert!(assets::Entity::find().all(&h.db).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_structural_validation_reports_every_defect() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;

    let csv = "\
project_name,target_language,quest_name
,spanish,Ch1
Luke,,Ch2
";
    let zip = build_zip(&[("data.csv", csv.as_bytes())]);
    let err = h
        .service
        .import(ImportMode::Project, zip, ctx(profile_id))
        .await
        .unwrap_err();

    let ImportError::ValidationFailed(problems) = err else {
        panic!("expected ValidationFailed, got {:?}", err);
    };
    assert_eq!(problems.len(), 2);
    assert!(problems[0].contains("row 1"));
    assert!(problems[1].contains("row 2"));

    assert!(projects::Entity::find().all(&h.db).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_archive_without_csv_is_terminal() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;

    let zip = build_zip(&[("media/a.mp3", b"\x00")]);
    let err = h
        .service
        .import(ImportMode::Project, zip, ctx(profile_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::NoTabularFile));

    let zip = build_zip(&[("a.csv", b"x"), ("b.csv", b"y")]);
    let err = h
        .service
        .import(ImportMode::Project, zip, ctx(profile_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::AmbiguousTabularFile(2)));
    Ok(())
}

#[tokio::test]
async fn test_asset_import_correlates_content_and_audio_by_position() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;
    let english_id = seed_languoid(&h.db, "English").await?;
    let project_id = seed_project(&h.db, "Luke", profile_id).await?;
    let quest_id = seed_quest(&h.db, project_id, "Ch1").await?;

    let csv = "\
asset_name,source_content,source_audio,source_language
Greeting,a;b;c,x.mp3;;z.mp3,english
";
    let zip = build_zip(&[
        ("data.csv", csv.as_bytes()),
        ("media/x.mp3", b"\x00x"),
        ("media/z.mp3", b"\x00z"),
    ]);

    let context = ImportContext {
        profile_id,
        project_id: None,
        quest_id: Some(quest_id),
    };
    let report = h.service.import(ImportMode::Asset, zip, context).await?;
    assert!(report.success(), "errors: {:?}", report.errors);
    assert_eq!(report.assets.created, 1);
    assert_eq!(report.content_links.created, 3);

    let links = asset_content_links::Entity::find()
        .order_by_asc(asset_content_links::Column::Id)
        .all(&h.db)
        .await?;
    assert_eq!(links.len(), 3);
    assert_eq!(links[0].text, "a");
    assert_eq!(links[1].text, "b");
    assert_eq!(links[2].text, "c");
    assert!(links[0].audio.is_some());
    // Empty slot in the audio list leaves the middle passage silent
    assert!(links[1].audio.is_none());
    assert!(links[2].audio.is_some());
    // Language lookup is case-insensitive
    assert_eq!(links[0].languoid_id, Some(english_id));

    // Asset landed under the context quest
    let link = quest_asset_links::Entity::find().one(&h.db).await?.unwrap();
    assert_eq!(link.quest_id, quest_id);
    Ok(())
}

#[tokio::test]
async fn test_legacy_column_names_still_accepted() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;
    let project_id = seed_project(&h.db, "Luke", profile_id).await?;
    let quest_id = seed_quest(&h.db, project_id, "Ch1").await?;

    let csv = "\
asset_name,asset_content
Greeting,old format text
";
    let zip = build_zip(&[("data.csv", csv.as_bytes())]);
    let context = ImportContext {
        profile_id,
        project_id: None,
        quest_id: Some(quest_id),
    };
    let report = h.service.import(ImportMode::Asset, zip, context).await?;
    assert!(report.success());

    let link = asset_content_links::Entity::find().one(&h.db).await?.unwrap();
    assert_eq!(link.text, "old format text");
    Ok(())
}

#[tokio::test]
async fn test_row_failure_does_not_abort_batch() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;
    let project_id = seed_project(&h.db, "Luke", profile_id).await?;
    let quest_id = seed_quest(&h.db, project_id, "Ch1").await?;

    let csv = "\
asset_name,source_content,source_audio
A1,t1,
A2,t2,
A3,t3,missing.mp3
A4,t4,
A5,t5,
";
    let zip = build_zip(&[("data.csv", csv.as_bytes())]);
    let context = ImportContext {
        profile_id,
        project_id: None,
        quest_id: Some(quest_id),
    };
    let report = h.service.import(ImportMode::Asset, zip, context).await?;

    assert!(!report.success());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 3);
    assert!(report.errors[0].message.contains("missing.mp3"));

    // Every row still produced its asset, including the failing one
    assert_eq!(report.assets.created, 5);
    assert_eq!(assets::Entity::find().all(&h.db).await?.len(), 5);

    // The failing row's passage exists with no audio attached
    let a3 = assets::Entity::find()
        .filter(assets::Column::Name.eq("A3"))
        .one(&h.db)
        .await?
        .unwrap();
    let link = asset_content_links::Entity::find()
        .filter(asset_content_links::Column::AssetId.eq(a3.id))
        .one(&h.db)
        .await?
        .unwrap();
    assert!(link.audio.is_none());
    Ok(())
}

#[tokio::test]
async fn test_missing_image_reported_by_both_checks() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;
    let project_id = seed_project(&h.db, "Luke", profile_id).await?;
    let quest_id = seed_quest(&h.db, project_id, "Ch1").await?;

    let csv = "\
asset_name,source_images
Greeting,nope.png
";
    let zip = build_zip(&[("data.csv", csv.as_bytes())]);
    let context = ImportContext {
        profile_id,
        project_id: None,
        quest_id: Some(quest_id),
    };
    let report = h.service.import(ImportMode::Asset, zip, context).await?;

    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().all(|e| e.row == 1));
    assert_ne!(report.errors[0].message, report.errors[1].message);

    let asset = assets::Entity::find().one(&h.db).await?.unwrap();
    assert!(asset.images.is_none());
    Ok(())
}

#[tokio::test]
async fn test_unknown_language_is_a_row_error_not_terminal() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;
    let project_id = seed_project(&h.db, "Luke", profile_id).await?;
    let quest_id = seed_quest(&h.db, project_id, "Ch1").await?;

    let csv = "\
asset_name,source_content,source_language
A1,hello,klingon
A2,world,klingon
";
    let zip = build_zip(&[("data.csv", csv.as_bytes())]);
    let context = ImportContext {
        profile_id,
        project_id: None,
        quest_id: Some(quest_id),
    };
    let report = h.service.import(ImportMode::Asset, zip, context).await?;

    assert_eq!(report.errors.len(), 2);
    assert!(report.errors[0].message.contains("klingon"));
    assert_eq!(report.assets.created, 2);

    let links = asset_content_links::Entity::find().all(&h.db).await?;
    assert!(links.iter().all(|l| l.languoid_id.is_none()));
    Ok(())
}

#[tokio::test]
async fn test_failed_language_lookups_are_cached() -> Result<()> {
    let h = harness().await?;
    let mut languages = LanguageService::new(h.db.clone());

    assert_eq!(languages.resolve("klingon").await?, None);
    assert_eq!(languages.resolve("klingon").await?, None);
    assert_eq!(languages.lookups(), 1);
    Ok(())
}

#[tokio::test]
async fn test_parent_quest_may_appear_after_its_child() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;
    let project_id = seed_project(&h.db, "Luke", profile_id).await?;

    let csv = "\
quest_name,parent_quest_name
Child,Parent
Parent,
";
    let zip = build_zip(&[("data.csv", csv.as_bytes())]);
    let context = ImportContext {
        profile_id,
        project_id: Some(project_id),
        quest_id: None,
    };
    let report = h.service.import(ImportMode::Quest, zip, context).await?;
    assert!(report.success(), "errors: {:?}", report.errors);
    assert_eq!(report.quests.created, 2);

    let parent = quests::Entity::find()
        .filter(quests::Column::Name.eq("Parent"))
        .one(&h.db)
        .await?
        .unwrap();
    let child = quests::Entity::find()
        .filter(quests::Column::Name.eq("Child"))
        .one(&h.db)
        .await?
        .unwrap();
    assert_eq!(child.parent_quest_id, Some(parent.id));
    assert_eq!(parent.parent_quest_id, None);
    Ok(())
}

#[tokio::test]
async fn test_unresolvable_parent_is_a_row_error() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;
    let project_id = seed_project(&h.db, "Luke", profile_id).await?;

    let csv = "\
quest_name,parent_quest_name
Child,Ghost
";
    let zip = build_zip(&[("data.csv", csv.as_bytes())]);
    let context = ImportContext {
        profile_id,
        project_id: Some(project_id),
        quest_id: None,
    };
    let report = h.service.import(ImportMode::Quest, zip, context).await?;

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 1);
    assert!(report.errors[0].message.contains("Ghost"));

    // The quest itself was still created, just unlinked
    assert_eq!(report.quests.created, 1);
    let child = quests::Entity::find().one(&h.db).await?.unwrap();
    assert_eq!(child.parent_quest_id, None);
    Ok(())
}

#[tokio::test]
async fn test_ambiguous_parent_name_binds_to_one_of_them() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;
    let project_id = seed_project(&h.db, "Luke", profile_id).await?;
    // Two pre-existing quests with the same name; parent resolution is by
    // name only, so either is a legal outcome
    let intro_a = seed_quest(&h.db, project_id, "Intro").await?;
    let intro_b = seed_quest(&h.db, project_id, "Intro").await?;

    let csv = "\
quest_name,parent_quest_name
Lesson,Intro
";
    let zip = build_zip(&[("data.csv", csv.as_bytes())]);
    let context = ImportContext {
        profile_id,
        project_id: Some(project_id),
        quest_id: None,
    };
    let report = h.service.import(ImportMode::Quest, zip, context).await?;
    assert!(report.success(), "errors: {:?}", report.errors);

    let lesson = quests::Entity::find()
        .filter(quests::Column::Name.eq("Lesson"))
        .one(&h.db)
        .await?
        .unwrap();
    let parent = lesson.parent_quest_id.expect("parent should be linked");
    assert!(parent == intro_a || parent == intro_b);
    Ok(())
}

#[tokio::test]
async fn test_asset_import_requires_quest_context() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;

    let csv = "asset_name\nGreeting\n";
    let zip = build_zip(&[("data.csv", csv.as_bytes())]);
    let err = h
        .service
        .import(ImportMode::Asset, zip.clone(), ctx(profile_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::MissingContext(_)));

    let context = ImportContext {
        profile_id,
        project_id: None,
        quest_id: Some(9999),
    };
    let err = h
        .service
        .import(ImportMode::Asset, zip, context)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::ContextNotFound { entity: "quest", .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_quest_import_requires_existing_project() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;

    let csv = "quest_name\nCh1\n";
    let zip = build_zip(&[("data.csv", csv.as_bytes())]);
    let context = ImportContext {
        profile_id,
        project_id: Some(424242),
        quest_id: None,
    };
    let err = h
        .service
        .import(ImportMode::Quest, zip, context)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::ContextNotFound {
            entity: "project",
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn test_tag_links_round_trip() -> Result<()> {
    let h = harness().await?;
    let profile_id = seed_profile(&h.db).await?;
    seed_languoid(&h.db, "spanish").await?;
    seed_languoid(&h.db, "english").await?;

    let report = h
        .service
        .import(ImportMode::Project, project_zip(), ctx(profile_id))
        .await?;
    assert!(report.success());

    let book = tags::Entity::find()
        .filter(tags::Column::Key.eq("book"))
        .filter(tags::Column::Value.eq("luke"))
        .one(&h.db)
        .await?
        .expect("quest tag should exist");
    let difficulty = tags::Entity::find()
        .filter(tags::Column::Key.eq("difficulty"))
        .one(&h.db)
        .await?
        .expect("asset tag should exist");
    assert_eq!(difficulty.value, "easy");

    let quest_links = quest_tag_links::Entity::find()
        .filter(quest_tag_links::Column::TagId.eq(book.id))
        .all(&h.db)
        .await?;
    assert_eq!(quest_links.len(), 1);

    let asset_links = asset_tag_links::Entity::find()
        .filter(asset_tag_links::Column::TagId.eq(difficulty.id))
        .all(&h.db)
        .await?;
    assert_eq!(asset_links.len(), 1);
    Ok(())
}
