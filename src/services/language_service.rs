//! Case-insensitive languoid lookup with a per-batch cache.
//!
//! The bulk import never creates languages; an unknown name is a row-scoped
//! error for the caller. Failed lookups are cached too, so a CSV full of
//! rows naming the same unknown language pays for one query, not one per row.

use std::collections::HashMap;

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use crate::database::entities::languoids;

pub struct LanguageService {
    db: DatabaseConnection,
    /// Keyed by the raw name string as it appears in the CSV; `None` is a
    /// cached "not found".
    cache: HashMap<String, Option<i32>>,
    lookups: usize,
}

impl LanguageService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            cache: HashMap::new(),
            lookups: 0,
        }
    }

    /// Resolve a free-text language name to a languoid id, or `None` when
    /// no languoid matches.
    pub async fn resolve(&mut self, raw: &str) -> Result<Option<i32>, DbErr> {
        if let Some(cached) = self.cache.get(raw) {
            return Ok(*cached);
        }

        self.lookups += 1;
        let found = languoids::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(languoids::Column::Name)))
                    .eq(raw.trim().to_lowercase()),
            )
            .one(&self.db)
            .await?;

        let id = found.map(|languoid| languoid.id);
        self.cache.insert(raw.to_string(), id);
        Ok(id)
    }

    /// Number of database lookups issued so far (cache misses).
    pub fn lookups(&self) -> usize {
        self.lookups
    }
}
