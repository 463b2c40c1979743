//! CSV structure validation.
//!
//! A bulk-upload CSV is classified into one of three import modes by its
//! column signature. The declared mode must match the file's actual shape;
//! the validator never silently reinterprets a file as a different mode.

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord};

use crate::errors::ImportError;

use super::import_service::ImportMode;

/// Column vocabulary for bulk-upload CSVs. The `source_*` names are the
/// current export format; `asset_*` equivalents are the legacy format still
/// accepted by the row normalizer.
pub mod columns {
    pub const PROJECT_NAME: &str = "project_name";
    pub const PROJECT_DESCRIPTION: &str = "project_description";
    pub const SOURCE_LANGUAGE: &str = "source_language";
    pub const TARGET_LANGUAGE: &str = "target_language";
    pub const QUEST_NAME: &str = "quest_name";
    pub const QUEST_DESCRIPTION: &str = "quest_description";
    pub const PARENT_QUEST_NAME: &str = "parent_quest_name";
    pub const QUEST_TAGS: &str = "quest_tags";
    pub const ASSET_NAME: &str = "asset_name";
    pub const ASSET_TAGS: &str = "asset_tags";
    pub const SOURCE_CONTENT: &str = "source_content";
    pub const LEGACY_CONTENT: &str = "asset_content";
    pub const SOURCE_IMAGES: &str = "source_images";
    pub const LEGACY_IMAGES: &str = "asset_images";
    pub const SOURCE_AUDIO: &str = "source_audio";
    pub const LEGACY_AUDIO: &str = "asset_audio";
}

/// Parsed CSV with header-indexed access. Values are trimmed; blank cells
/// and absent columns both read as `None`.
pub struct SheetTable {
    column_index: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

impl SheetTable {
    pub fn parse(text: &str) -> Result<Self, ImportError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let column_index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?);
        }

        Ok(Self { column_index, rows })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index.contains_key(name)
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Trimmed cell value, or `None` when the column is absent or the cell
    /// is blank.
    pub fn value<'a>(&self, row: &'a StringRecord, column: &str) -> Option<&'a str> {
        let idx = *self.column_index.get(column)?;
        let raw = row.get(idx)?.trim();
        if raw.is_empty() {
            None
        } else {
            Some(raw)
        }
    }

    /// Current-format column first, legacy column second, else `None`.
    pub fn value_with_legacy<'a>(
        &self,
        row: &'a StringRecord,
        current: &str,
        legacy: &str,
    ) -> Option<&'a str> {
        self.value(row, current).or_else(|| self.value(row, legacy))
    }
}

fn matches_signature(table: &SheetTable, mode: ImportMode) -> bool {
    match mode {
        ImportMode::Project => {
            table.has_column(columns::PROJECT_NAME)
                && (table.has_column(columns::SOURCE_LANGUAGE)
                    || table.has_column(columns::TARGET_LANGUAGE))
        }
        ImportMode::Quest => {
            table.has_column(columns::QUEST_NAME) && !table.has_column(columns::PROJECT_NAME)
        }
        ImportMode::Asset => {
            table.has_column(columns::ASSET_NAME) && !table.has_column(columns::QUEST_NAME)
        }
    }
}

/// Classify which import mode the column set actually resembles.
pub fn detect_mode(table: &SheetTable) -> Option<ImportMode> {
    [ImportMode::Project, ImportMode::Quest, ImportMode::Asset]
        .into_iter()
        .find(|mode| matches_signature(table, *mode))
}

fn required_fields(mode: ImportMode) -> &'static [&'static str] {
    match mode {
        ImportMode::Project => &[
            columns::PROJECT_NAME,
            columns::TARGET_LANGUAGE,
            columns::QUEST_NAME,
        ],
        ImportMode::Quest => &[columns::QUEST_NAME],
        ImportMode::Asset => &[columns::ASSET_NAME],
    }
}

/// Verify the table matches the declared import mode.
///
/// All row-level defects are collected before returning so the caller sees
/// the complete picture, not just the first failure. After this passes,
/// every later stage may assume the mode's required fields are present and
/// non-empty on every row.
pub fn validate_structure(table: &SheetTable, mode: ImportMode) -> Result<(), ImportError> {
    if !matches_signature(table, mode) {
        let detected = detect_mode(table).filter(|m| *m != mode);
        return Err(ImportError::mode_mismatch(mode, detected));
    }

    let mut problems = Vec::new();
    for (idx, row) in table.rows().iter().enumerate() {
        let row_number = idx + 1;
        for field in required_fields(mode) {
            if table.value(row, field).is_none() {
                problems.push(format!(
                    "row {}: missing required field '{}'",
                    row_number, field
                ));
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ImportError::ValidationFailed(problems))
    }
}
