//! Process-local content store. State is lost when the process exits.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::{collections::HashMap, time::Duration, time::Instant};
use tokio::sync::RwLock;

use super::{ContentStore, StoreError};
use crate::content::{self, defaults, Mutation, Section};

pub struct MemoryContentStore {
    sections: RwLock<HashMap<Section, Value>>,
}

impl MemoryContentStore {
    /// Store seeded with the default content of every section.
    pub fn new() -> Self {
        Self::with_sections(defaults::all(Utc::now()))
    }

    pub fn with_sections(sections: impl IntoIterator<Item = (Section, Value)>) -> Self {
        Self {
            sections: RwLock::new(sections.into_iter().collect()),
        }
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn snapshot(&self) -> Result<Map<String, Value>, StoreError> {
        let sections = self.sections.read().await;
        let now = Utc::now();
        Ok(Section::ALL
            .into_iter()
            .map(|section| {
                let value = sections
                    .get(&section)
                    .cloned()
                    .unwrap_or_else(|| defaults::section(section, now));
                (section.as_str().to_string(), value)
            })
            .collect())
    }

    async fn section(&self, section: Section) -> Result<Value, StoreError> {
        let sections = self.sections.read().await;
        Ok(sections
            .get(&section)
            .cloned()
            .unwrap_or_else(|| defaults::section(section, Utc::now())))
    }

    async fn mutate(&self, section: Section, mutation: Mutation) -> Result<Option<Value>, StoreError> {
        // Held across read, validate and write so concurrent writers serialize.
        let mut sections = self.sections.write().await;
        let current = sections
            .get(&section)
            .cloned()
            .unwrap_or_else(|| defaults::section(section, Utc::now()));

        let applied = content::apply(section, &current, mutation)?;
        if applied.affected.is_some() {
            sections.insert(section, applied.value);
        }
        Ok(applied.affected)
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        let _ = self.sections.read().await;
        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{into_object, ContentError};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_snapshot_contains_every_section() {
        let store = MemoryContentStore::new();
        let snapshot = store.snapshot().await.unwrap();
        for section in Section::ALL {
            assert!(snapshot.contains_key(section.as_str()), "missing {section}");
        }
    }

    #[tokio::test]
    async fn test_missing_section_reads_as_default() {
        let store = MemoryContentStore::with_sections(Vec::new());
        let hero = store.section(Section::Hero).await.unwrap();
        assert_eq!(hero["title"], "Full Stack Developer");
    }

    #[tokio::test]
    async fn test_rejected_write_leaves_section_unchanged() {
        let store = MemoryContentStore::new();
        let before = store.section(Section::Hero).await.unwrap();

        let result = store
            .mutate(
                Section::Hero,
                Mutation::Merge(into_object(json!({ "unexpected": true })).unwrap()),
            )
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Content(ContentError::Schema { .. }))
        ));
        assert_eq!(store.section(Section::Hero).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_get_distinct_ids() {
        let store = Arc::new(MemoryContentStore::with_sections(vec![(
            Section::Projects,
            json!([]),
        )]));
        let at = Utc::now();

        let mut handles = Vec::new();
        for n in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .mutate(
                        Section::Projects,
                        Mutation::Insert {
                            item: into_object(json!({ "title": format!("Project {n}") })).unwrap(),
                            at,
                        },
                    )
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let projects = store.section(Section::Projects).await.unwrap();
        let mut ids: Vec<&str> = projects
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 16);
    }

    #[tokio::test]
    async fn test_ping_succeeds() {
        assert!(MemoryContentStore::new().ping().await.is_ok());
    }
}
