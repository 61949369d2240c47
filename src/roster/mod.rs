use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::scores::ScoreError;

/// Caller-assigned, unique per roster.
pub type EntityId = i64;

/// Where to find an entity on the external ranking site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLookup {
    /// The site's textual handle for the entity, e.g. "jasmin-roeper".
    pub search_key: String,
    /// Region path segment of the ranking page, e.g. "de".
    pub region: String,
    /// City query value of the ranking page, e.g. "Nuremberg".
    pub locale: String,
}

/// A roster member. Entities are built by the caller and never mutated
/// by the score lookup.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub lookup: Option<ExternalLookup>,
}

impl Entity {
    pub fn ranked(
        id: EntityId,
        search_key: impl Into<String>,
        region: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            id,
            lookup: Some(ExternalLookup {
                search_key: search_key.into(),
                region: region.into(),
                locale: locale.into(),
            }),
        }
    }

    pub fn unranked(id: EntityId) -> Self {
        Self { id, lookup: None }
    }

    /// Lookup metadata, if this entity should be dispatched to the
    /// network at all. An empty search key counts as unranked.
    pub fn lookup_target(&self) -> Option<&ExternalLookup> {
        self.lookup.as_ref().filter(|l| !l.search_key.is_empty())
    }
}

/// The listing side of the roster collaborator. The aggregator only ever
/// calls `list` with an empty filter to obtain the full roster.
#[async_trait]
pub trait EntityLister: Send + Sync {
    async fn list(&self, filter: &str) -> Result<Vec<Entity>, ScoreError>;
}

/// In-memory roster, typically built from the config file.
pub struct StaticRoster {
    entities: Vec<Entity>,
}

impl StaticRoster {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl EntityLister for StaticRoster {
    /// List roster entries; a non-empty filter matches case-insensitively
    /// against the search key.
    async fn list(&self, filter: &str) -> Result<Vec<Entity>, ScoreError> {
        if filter.is_empty() {
            return Ok(self.entities.clone());
        }

        let needle = filter.to_uppercase();
        Ok(self
            .entities
            .iter()
            .filter(|e| {
                e.lookup_target()
                    .is_some_and(|l| l.search_key.to_uppercase().contains(&needle))
            })
            .cloned()
            .collect())
    }
}
