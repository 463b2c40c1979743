//! Bulk import orchestration.
//!
//! Imports an entire project/quest/asset hierarchy from one uploaded ZIP
//! archive: one CSV data file plus media under `media/`. The pipeline runs
//! in phases: archive extraction, structure validation, media upload,
//! project resolution, quest resolution, parent linking, then a sequential
//! row loop materializing assets. Rows are processed strictly in file order
//! because later rows may reference quests created by earlier ones.
//!
//! A single row's failure never aborts the batch: row-scoped problems are
//! collected in the [`ImportReport`] with the 1-based data row they came
//! from, and processing moves on.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use csv::StringRecord;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;
use tracing::info;

use crate::database::entities::{
    asset_content_links, asset_tag_links, assets, profile_project_links, project_languoid_links,
    projects, quest_asset_links, quest_tag_links, quests,
};
use crate::errors::ImportError;
use crate::storage::ObjectStore;

use super::archive_service::extract_archive;
use super::language_service::LanguageService;
use super::media_service::MediaService;
use super::tag_service::{parse_tags, TagResolution, TagService};
use super::validation_service::{columns, validate_structure, SheetTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportMode {
    Project,
    Quest,
    Asset,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportMode::Project => "project",
            ImportMode::Quest => "quest",
            ImportMode::Asset => "asset",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" => Ok(ImportMode::Project),
            "quest" => Ok(ImportMode::Quest),
            "asset" => Ok(ImportMode::Asset),
            other => Err(format!("unknown import mode '{}'", other)),
        }
    }
}

/// Caller-supplied ids scoping the import: `project_id` is required for
/// quest-mode imports, `quest_id` for asset-mode imports.
#[derive(Clone, Copy, Debug)]
pub struct ImportContext {
    pub profile_id: i32,
    pub project_id: Option<i32>,
    pub quest_id: Option<i32>,
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct EntityCount {
    pub read: u32,
    pub created: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct RowIssue {
    /// 1-based data row the issue belongs to (first row after the header
    /// is row 1).
    pub row: usize,
    pub message: String,
}

/// Final report of one import batch. Warnings never affect success.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub projects: EntityCount,
    pub quests: EntityCount,
    pub assets: EntityCount,
    pub content_links: EntityCount,
    pub tags: EntityCount,
    pub errors: Vec<RowIssue>,
    pub warnings: Vec<RowIssue>,
}

impl ImportReport {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, row: usize, message: impl Into<String>) {
        self.errors.push(RowIssue {
            row,
            message: message.into(),
        });
    }

    fn warning(&mut self, row: usize, message: impl Into<String>) {
        self.warnings.push(RowIssue {
            row,
            message: message.into(),
        });
    }
}

/// Quest identity within one batch: `(project id, parent quest name, quest
/// name)`. The parent component distinguishes same-named quests that rows
/// place under different parents.
type QuestKey = (i32, String, String);

/// Per-batch entity resolution state. Scoped to one import invocation so
/// nothing leaks across requests.
struct Batch {
    report: ImportReport,
    languages: LanguageService,
    tags: TagService,
    /// Archive filename to storage key, from the media upload stage.
    media_keys: HashMap<String, String>,
    /// Project name to id, built in Phase A.
    project_ids: HashMap<String, i32>,
    /// `(project id, quest name)` to id. Seeded from quests already persisted
    /// for the involved projects, extended as the batch creates new ones, so
    /// later rows can reference earlier quests as parents.
    quest_index: HashMap<(i32, String), i32>,
    /// Composite-key map driving parent linking; the row number is the first
    /// data row that introduced the key, used to attribute linking errors.
    resolved_quests: HashMap<QuestKey, (i32, usize)>,
    /// Quest ids already counted toward the report.
    counted_quests: HashSet<i32>,
    /// Quest ids created by this batch (reads are only counted for quests
    /// that predate the batch).
    created_quests: HashSet<i32>,
}

impl Batch {
    fn new(db: DatabaseConnection) -> Self {
        Self {
            report: ImportReport::default(),
            languages: LanguageService::new(db.clone()),
            tags: TagService::new(db),
            media_keys: HashMap::new(),
            project_ids: HashMap::new(),
            quest_index: HashMap::new(),
            resolved_quests: HashMap::new(),
            counted_quests: HashSet::new(),
            created_quests: HashSet::new(),
        }
    }
}

struct NormalizedRow {
    content: Option<String>,
    images: Option<String>,
    audio: Option<String>,
    languoid_id: Option<i32>,
}

pub struct ImportService {
    db: DatabaseConnection,
    store: Arc<dyn ObjectStore>,
}

impl ImportService {
    pub fn new(db: DatabaseConnection, store: Arc<dyn ObjectStore>) -> Self {
        Self { db, store }
    }

    /// Run the full bulk-import pipeline over one uploaded archive.
    ///
    /// Terminal failures (bad archive, wrong structure, missing context)
    /// return `Err` before any entity is created. Once row processing
    /// starts, the result is always `Ok` and partial success shows up as
    /// row-indexed errors in the report.
    pub async fn import(
        &self,
        mode: ImportMode,
        archive_bytes: Vec<u8>,
        ctx: ImportContext,
    ) -> Result<ImportReport, ImportError> {
        info!("Starting {} import ({} bytes)", mode, archive_bytes.len());

        let extracted = extract_archive(&archive_bytes)?;
        let table = SheetTable::parse(&extracted.table_text)?;
        validate_structure(&table, mode)?;

        // Asset-mode rows attach to one fixed quest; resolve it up front.
        let fixed_target = match mode {
            ImportMode::Project => None,
            ImportMode::Quest => {
                let project_id = ctx
                    .project_id
                    .ok_or(ImportError::MissingContext("project_id for quest imports"))?;
                projects::Entity::find_by_id(project_id)
                    .one(&self.db)
                    .await?
                    .ok_or(ImportError::ContextNotFound {
                        entity: "project",
                        id: project_id,
                    })?;
                None
            }
            ImportMode::Asset => {
                let quest_id = ctx
                    .quest_id
                    .ok_or(ImportError::MissingContext("quest_id for asset imports"))?;
                let quest = quests::Entity::find_by_id(quest_id)
                    .one(&self.db)
                    .await?
                    .ok_or(ImportError::ContextNotFound {
                        entity: "quest",
                        id: quest_id,
                    })?;
                Some((quest.project_id, quest.id))
            }
        };

        let mut batch = Batch::new(self.db.clone());
        batch.media_keys = MediaService::new(self.store.clone())
            .upload_all(extracted.media)
            .await;

        if mode == ImportMode::Project {
            self.prepare_projects(&table, ctx, &mut batch).await?;
        }
        if mode != ImportMode::Asset {
            self.prepare_quests(&table, mode, ctx, &mut batch).await?;
            self.link_parent_quests(&mut batch).await;
        }

        for (idx, row) in table.rows().iter().enumerate() {
            let row_number = idx + 1;
            if let Err(err) = self
                .materialize_row(&table, row, row_number, mode, ctx, fixed_target, &mut batch)
                .await
            {
                batch.report.error(row_number, err.to_string());
            }
        }

        info!(
            "Import finished: {} projects, {} quests, {} assets created; {} errors, {} warnings",
            batch.report.projects.created,
            batch.report.quests.created,
            batch.report.assets.created,
            batch.report.errors.len(),
            batch.report.warnings.len()
        );
        Ok(batch.report)
    }

    /// Phase A: find-or-create every distinct project named in the batch.
    async fn prepare_projects(
        &self,
        table: &SheetTable,
        ctx: ImportContext,
        batch: &mut Batch,
    ) -> Result<(), ImportError> {
        for (idx, row) in table.rows().iter().enumerate() {
            let row_number = idx + 1;
            let Some(name) = table.value(row, columns::PROJECT_NAME) else {
                continue;
            };
            if batch.project_ids.contains_key(name) {
                continue;
            }

            match self.resolve_project(name, table, row, ctx, batch).await {
                Ok((project_id, created)) => {
                    batch.project_ids.insert(name.to_string(), project_id);
                    if created {
                        batch.report.projects.created += 1;
                    } else {
                        batch.report.projects.read += 1;
                    }
                }
                Err(err) => {
                    batch
                        .report
                        .error(row_number, format!("project '{}': {}", name, err));
                }
            }
        }
        Ok(())
    }

    /// Find a project owned by the importing profile, or create it with
    /// ownership bootstrap and target-language link. Returns `(id, created)`.
    async fn resolve_project(
        &self,
        name: &str,
        table: &SheetTable,
        row: &StringRecord,
        ctx: ImportContext,
        batch: &mut Batch,
    ) -> Result<(i32, bool)> {
        if let Some(existing) = self.find_project(name, ctx.profile_id).await? {
            return Ok((existing.id, false));
        }

        let target = table
            .value(row, columns::TARGET_LANGUAGE)
            .ok_or_else(|| anyhow!("missing target_language"))?;
        let languoid_id = batch
            .languages
            .resolve(target)
            .await?
            .ok_or_else(|| anyhow!("unknown target language '{}'", target))?;

        let now = Utc::now();
        let model = projects::ActiveModel {
            name: Set(name.to_string()),
            description: Set(table
                .value(row, columns::PROJECT_DESCRIPTION)
                .map(str::to_string)),
            creator_id: Set(ctx.profile_id),
            target_languoid_id: Set(Some(languoid_id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let project = match model.insert(&self.db).await {
            Ok(project) => project,
            Err(insert_err) => {
                // Unique (name, creator) constraint hit: a concurrent import
                // created the project first. Fetch and reuse it.
                match self.find_project(name, ctx.profile_id).await? {
                    Some(existing) => return Ok((existing.id, false)),
                    None => return Err(insert_err.into()),
                }
            }
        };

        // Ownership must exist before the language link; downstream
        // authorization rules depend on it.
        profile_project_links::ActiveModel {
            profile_id: Set(ctx.profile_id),
            project_id: Set(project.id),
            membership: Set("owner".to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        project_languoid_links::ActiveModel {
            project_id: Set(project.id),
            languoid_id: Set(languoid_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok((project.id, true))
    }

    async fn find_project(
        &self,
        name: &str,
        profile_id: i32,
    ) -> Result<Option<projects::Model>, sea_orm::DbErr> {
        projects::Entity::find()
            .filter(projects::Column::Name.eq(name))
            .filter(projects::Column::CreatorId.eq(profile_id))
            .one(&self.db)
            .await
    }

    /// Phase B: find-or-create every distinct quest named in the batch.
    ///
    /// Existing quests for all involved projects are fetched in one query
    /// and indexed by `(project id, name)` before the row scan, so repeated
    /// imports reuse them instead of duplicating.
    async fn prepare_quests(
        &self,
        table: &SheetTable,
        mode: ImportMode,
        ctx: ImportContext,
        batch: &mut Batch,
    ) -> Result<(), ImportError> {
        let involved_projects: Vec<i32> = match mode {
            ImportMode::Project => batch.project_ids.values().copied().collect(),
            _ => vec![ctx
                .project_id
                .ok_or(ImportError::MissingContext("project_id for quest imports"))?],
        };

        let existing = quests::Entity::find()
            .filter(quests::Column::ProjectId.is_in(involved_projects))
            .all(&self.db)
            .await?;
        for quest in existing {
            batch
                .quest_index
                .insert((quest.project_id, quest.name), quest.id);
        }

        for (idx, row) in table.rows().iter().enumerate() {
            let row_number = idx + 1;
            let Some(quest_name) = table.value(row, columns::QUEST_NAME) else {
                continue;
            };

            let project_id = match mode {
                ImportMode::Project => {
                    let resolved = table
                        .value(row, columns::PROJECT_NAME)
                        .and_then(|name| batch.project_ids.get(name).copied());
                    match resolved {
                        Some(id) => id,
                        // Phase A already reported why this project is missing
                        None => continue,
                    }
                }
                _ => match ctx.project_id {
                    Some(id) => id,
                    None => continue,
                },
            };

            let parent_name = table
                .value(row, columns::PARENT_QUEST_NAME)
                .unwrap_or("")
                .to_string();
            let key: QuestKey = (project_id, parent_name, quest_name.to_string());
            if batch.resolved_quests.contains_key(&key) {
                continue;
            }

            if let Some(&quest_id) = batch.quest_index.get(&(project_id, quest_name.to_string())) {
                batch.resolved_quests.insert(key, (quest_id, row_number));
                if batch.counted_quests.insert(quest_id) && !batch.created_quests.contains(&quest_id)
                {
                    batch.report.quests.read += 1;
                }
                continue;
            }

            match self
                .create_quest(project_id, quest_name, table, row, row_number, batch)
                .await
            {
                Ok(quest_id) => {
                    batch
                        .quest_index
                        .insert((project_id, quest_name.to_string()), quest_id);
                    batch.resolved_quests.insert(key, (quest_id, row_number));
                    batch.counted_quests.insert(quest_id);
                    batch.created_quests.insert(quest_id);
                    batch.report.quests.created += 1;
                }
                Err(err) => {
                    batch
                        .report
                        .error(row_number, format!("quest '{}': {}", quest_name, err));
                }
            }
        }
        Ok(())
    }

    async fn create_quest(
        &self,
        project_id: i32,
        name: &str,
        table: &SheetTable,
        row: &StringRecord,
        row_number: usize,
        batch: &mut Batch,
    ) -> Result<i32> {
        let now = Utc::now();
        let quest = quests::ActiveModel {
            name: Set(name.to_string()),
            description: Set(table
                .value(row, columns::QUEST_DESCRIPTION)
                .map(str::to_string)),
            project_id: Set(project_id),
            parent_quest_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let quest = quest.insert(&self.db).await?;

        if let Some(raw) = table.value(row, columns::QUEST_TAGS) {
            for pair in parse_tags(raw) {
                match batch.tags.resolve(&pair.key, &pair.value).await {
                    Ok(resolution) => {
                        self.count_tag(&resolution, batch);
                        let link = quest_tag_links::ActiveModel {
                            quest_id: Set(quest.id),
                            tag_id: Set(resolution.id()),
                            created_at: Set(now),
                            ..Default::default()
                        };
                        if let Err(err) = link.insert(&self.db).await {
                            batch.report.warning(
                                row_number,
                                format!("failed to link tag '{}' to quest '{}': {}", pair.key, name, err),
                            );
                        }
                    }
                    Err(err) => {
                        batch.report.warning(
                            row_number,
                            format!("failed to resolve tag '{}': {}", pair.key, err),
                        );
                    }
                }
            }
        }

        Ok(quest.id)
    }

    /// Phase C: rewrite parent-quest references.
    ///
    /// Runs only after every quest in the batch exists, because a quest may
    /// be referenced as a parent before its own row appears in the CSV.
    /// Parents are matched by `(project id, parent name)` alone; when two
    /// quests in one project share a name, the child binds to whichever the
    /// index holds, an accepted limitation of the format.
    async fn link_parent_quests(&self, batch: &mut Batch) {
        let pending: Vec<(QuestKey, (i32, usize))> = batch
            .resolved_quests
            .iter()
            .map(|(key, value)| (key.clone(), *value))
            .collect();

        for ((project_id, parent_name, quest_name), (quest_id, row_number)) in pending {
            if parent_name.is_empty() {
                continue;
            }
            match batch.quest_index.get(&(project_id, parent_name.clone())) {
                Some(&parent_id) if parent_id != quest_id => {
                    let update = quests::ActiveModel {
                        id: Set(quest_id),
                        parent_quest_id: Set(Some(parent_id)),
                        updated_at: Set(Utc::now()),
                        ..Default::default()
                    };
                    if let Err(err) = update.update(&self.db).await {
                        batch.report.error(
                            row_number,
                            format!("failed to link quest '{}' to parent '{}': {}", quest_name, parent_name, err),
                        );
                    }
                }
                // A quest can resolve itself as parent when it shares the
                // parent's name; leave it unlinked rather than self-loop.
                Some(_) => {}
                None => {
                    batch.report.error(
                        row_number,
                        format!("parent quest '{}' not found for quest '{}'", parent_name, quest_name),
                    );
                }
            }
        }
    }

    /// Create one asset with its tags, quest link, and content links.
    ///
    /// Any error escaping this function is caught at the row boundary and
    /// recorded against the row; the batch continues.
    #[allow(clippy::too_many_arguments)]
    async fn materialize_row(
        &self,
        table: &SheetTable,
        row: &StringRecord,
        row_number: usize,
        mode: ImportMode,
        ctx: ImportContext,
        fixed_target: Option<(i32, i32)>,
        batch: &mut Batch,
    ) -> Result<()> {
        // Rows without an asset name only define quests
        let Some(asset_name) = table.value(row, columns::ASSET_NAME) else {
            return Ok(());
        };

        let (project_id, quest_id) = match (mode, fixed_target) {
            (ImportMode::Asset, Some(target)) => target,
            _ => {
                let quest_name = table
                    .value(row, columns::QUEST_NAME)
                    .ok_or_else(|| anyhow!("missing quest_name"))?;
                let project_id = match mode {
                    ImportMode::Project => {
                        let project_name = table
                            .value(row, columns::PROJECT_NAME)
                            .ok_or_else(|| anyhow!("missing project_name"))?;
                        batch
                            .project_ids
                            .get(project_name)
                            .copied()
                            .ok_or_else(|| anyhow!("project '{}' was not resolved", project_name))?
                    }
                    _ => ctx
                        .project_id
                        .ok_or_else(|| anyhow!("missing project context"))?,
                };
                let quest_id = batch
                    .quest_index
                    .get(&(project_id, quest_name.to_string()))
                    .copied()
                    .ok_or_else(|| anyhow!("quest '{}' was not resolved", quest_name))?;
                (project_id, quest_id)
            }
        };

        let normalized = self.normalize_row(table, row, row_number, batch).await?;

        // Resolve referenced images; a missing file is a row error but the
        // asset is still created without it
        let image_names = split_list(normalized.images.as_deref());
        let mut image_keys = Vec::new();
        for name in &image_names {
            match batch.media_keys.get(name) {
                Some(key) => image_keys.push(key.clone()),
                None => {
                    batch
                        .report
                        .error(row_number, format!("image file '{}' not found in archive", name));
                }
            }
        }
        let images_json = if image_keys.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&image_keys)?)
        };

        let now = Utc::now();
        let asset = assets::ActiveModel {
            name: Set(asset_name.to_string()),
            creator_id: Set(ctx.profile_id),
            project_id: Set(project_id),
            visible: Set(true),
            images: Set(images_json),
            source_asset_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let asset = asset.insert(&self.db).await?;
        batch.report.assets.created += 1;

        if let Some(raw) = table.value(row, columns::ASSET_TAGS) {
            for pair in parse_tags(raw) {
                match batch.tags.resolve(&pair.key, &pair.value).await {
                    Ok(resolution) => {
                        self.count_tag(&resolution, batch);
                        let link = asset_tag_links::ActiveModel {
                            asset_id: Set(asset.id),
                            tag_id: Set(resolution.id()),
                            created_at: Set(now),
                            ..Default::default()
                        };
                        if let Err(err) = link.insert(&self.db).await {
                            batch.report.warning(
                                row_number,
                                format!(
                                    "failed to link tag '{}' to asset '{}': {}",
                                    pair.key, asset_name, err
                                ),
                            );
                        }
                    }
                    Err(err) => {
                        batch.report.warning(
                            row_number,
                            format!("failed to resolve tag '{}': {}", pair.key, err),
                        );
                    }
                }
            }
        }

        quest_asset_links::ActiveModel {
            quest_id: Set(quest_id),
            asset_id: Set(asset.id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        // One content link per position; the shorter of the two lists pads
        // with empty text / null audio rather than truncating
        let content_items = split_list(normalized.content.as_deref());
        let audio_items = split_list(normalized.audio.as_deref());
        for (text, clip) in pair_content_audio(&content_items, &audio_items) {
            let audio_json = match clip {
                Some(filename) => match batch.media_keys.get(&filename) {
                    Some(key) => Some(serde_json::to_string(&[key.as_str()])?),
                    None => {
                        batch.report.error(
                            row_number,
                            format!("audio file '{}' not found in archive", filename),
                        );
                        None
                    }
                },
                None => None,
            };
            asset_content_links::ActiveModel {
                asset_id: Set(asset.id),
                text: Set(text),
                audio: Set(audio_json),
                languoid_id: Set(normalized.languoid_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&self.db)
            .await?;
            batch.report.content_links.created += 1;
        }

        // Second, independent sweep over the referenced image filenames so
        // the report shows every unresolved name even when asset creation
        // already dropped it from the array
        for name in &image_names {
            if !batch.media_keys.contains_key(name) {
                batch.report.error(
                    row_number,
                    format!("image '{}' was referenced but never uploaded", name),
                );
            }
        }

        Ok(())
    }

    /// Reconcile current and legacy field names into one canonical record
    /// and resolve the row's source language.
    async fn normalize_row(
        &self,
        table: &SheetTable,
        row: &StringRecord,
        row_number: usize,
        batch: &mut Batch,
    ) -> Result<NormalizedRow> {
        let content = table
            .value_with_legacy(row, columns::SOURCE_CONTENT, columns::LEGACY_CONTENT)
            .map(str::to_string);
        let images = table
            .value_with_legacy(row, columns::SOURCE_IMAGES, columns::LEGACY_IMAGES)
            .map(str::to_string);
        let audio = table
            .value_with_legacy(row, columns::SOURCE_AUDIO, columns::LEGACY_AUDIO)
            .map(str::to_string);

        let languoid_id = match table.value(row, columns::SOURCE_LANGUAGE) {
            Some(raw) => {
                let resolved = batch.languages.resolve(raw).await?;
                if resolved.is_none() {
                    batch
                        .report
                        .error(row_number, format!("unknown source language '{}'", raw));
                }
                resolved
            }
            None => None,
        };

        Ok(NormalizedRow {
            content,
            images,
            audio,
            languoid_id,
        })
    }

    fn count_tag(&self, resolution: &TagResolution, batch: &mut Batch) {
        match resolution {
            TagResolution::Created(_) => batch.report.tags.created += 1,
            TagResolution::Existing(_) => batch.report.tags.read += 1,
        }
    }
}

/// Split a semicolon-delimited field into trimmed items. A missing or blank
/// field yields no items; interior empty segments are kept so positions
/// stay aligned.
fn split_list(raw: Option<&str>) -> Vec<String> {
    match raw {
        None => Vec::new(),
        Some(s) if s.trim().is_empty() => Vec::new(),
        Some(s) => s.split(';').map(|part| part.trim().to_string()).collect(),
    }
}

/// Pair content and audio lists positionally. Position `i` of the content
/// list goes with position `i` of the audio list; absent positions become
/// empty text or no audio.
fn pair_content_audio(content: &[String], audio: &[String]) -> Vec<(String, Option<String>)> {
    let n = content.len().max(audio.len());
    (0..n)
        .map(|i| {
            let text = content.get(i).cloned().unwrap_or_default();
            let clip = audio.get(i).filter(|item| !item.is_empty()).cloned();
            (text, clip)
        })
        .collect()
}
