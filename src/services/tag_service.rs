//! Tag parsing and find-or-create resolution.
//!
//! Tag strings are semicolon-delimited `key:value` pairs; a segment without
//! a `:` is a legacy single-token tag whose value is empty. Resolution is
//! cached per batch by `(key, value)` so repeated references cost one round
//! trip at most.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};

use crate::database::entities::tags;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagPair {
    pub key: String,
    pub value: String,
}

/// Parse a semicolon-delimited tag string into ordered `(key, value)` pairs.
pub fn parse_tags(raw: &str) -> Vec<TagPair> {
    raw.split(';')
        .filter_map(|segment| {
            let segment = segment.trim();
            if segment.is_empty() {
                return None;
            }
            // Split on the first ':' only; values may themselves contain ':'
            let (key, value) = match segment.split_once(':') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (segment, ""),
            };
            Some(TagPair {
                key: key.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagResolution {
    Existing(i32),
    Created(i32),
}

impl TagResolution {
    pub fn id(&self) -> i32 {
        match self {
            TagResolution::Existing(id) | TagResolution::Created(id) => *id,
        }
    }
}

pub struct TagService {
    db: DatabaseConnection,
    cache: HashMap<(String, String), i32>,
}

impl TagService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            cache: HashMap::new(),
        }
    }

    /// Return a stable tag id for `(key, value)`, creating the tag when no
    /// exact match exists.
    pub async fn resolve(&mut self, key: &str, value: &str) -> Result<TagResolution, DbErr> {
        let cache_key = (key.to_string(), value.to_string());
        if let Some(&id) = self.cache.get(&cache_key) {
            return Ok(TagResolution::Existing(id));
        }

        if let Some(existing) = tags::Entity::find()
            .filter(tags::Column::Key.eq(key))
            .filter(tags::Column::Value.eq(value))
            .one(&self.db)
            .await?
        {
            self.cache.insert(cache_key, existing.id);
            return Ok(TagResolution::Existing(existing.id));
        }

        let tag = tags::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let tag = match tag.insert(&self.db).await {
            Ok(tag) => tag,
            // Unique (key, value) race: another import created it, reuse theirs
            Err(insert_err) => {
                if let Some(existing) = tags::Entity::find()
                    .filter(tags::Column::Key.eq(key))
                    .filter(tags::Column::Value.eq(value))
                    .one(&self.db)
                    .await?
                {
                    self.cache.insert(cache_key, existing.id);
                    return Ok(TagResolution::Existing(existing.id));
                }
                return Err(insert_err);
            }
        };

        self.cache.insert(cache_key, tag.id);
        Ok(TagResolution::Created(tag.id))
    }
}
