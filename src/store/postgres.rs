//! PostgreSQL-backed content store (`portfolio_sections`, one JSONB row per section).

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration, time::Instant};

use super::{ContentStore, StoreError};
use crate::content::{self, defaults, Mutation, Section};
use crate::db::models::PortfolioSection;

pub struct PgContentStore {
    pool: Arc<PgPool>,
}

impl PgContentStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Insert the default value of every section that has no row yet.
    pub async fn seed_defaults(&self) -> Result<(), StoreError> {
        for (section, value) in defaults::all(Utc::now()) {
            sqlx::query(
                r#"
                INSERT INTO portfolio_sections (key, content, updated_at)
                VALUES ($1, $2, now())
                ON CONFLICT (key) DO NOTHING
                "#,
            )
            .bind(section.as_str())
            .bind(&value)
            .execute(self.pool.as_ref())
            .await?;
        }
        tracing::info!("Portfolio sections seeded");
        Ok(())
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn snapshot(&self) -> Result<Map<String, Value>, StoreError> {
        let rows = sqlx::query_as::<_, PortfolioSection>(
            "SELECT key, content, updated_at FROM portfolio_sections",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        let now = Utc::now();
        let mut snapshot: Map<String, Value> = Section::ALL
            .into_iter()
            .map(|section| (section.as_str().to_string(), defaults::section(section, now)))
            .collect();
        for row in rows {
            // Rows for sections that no longer exist are ignored.
            if row.key.parse::<Section>().is_ok() {
                snapshot.insert(row.key, row.content);
            }
        }
        Ok(snapshot)
    }

    async fn section(&self, section: Section) -> Result<Value, StoreError> {
        let row = sqlx::query_as::<_, PortfolioSection>(
            "SELECT key, content, updated_at FROM portfolio_sections WHERE key = $1",
        )
        .bind(section.as_str())
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(match row {
            Some(row) => row.content,
            None => {
                tracing::debug!("Section '{}' not found in database, using defaults", section);
                defaults::section(section, Utc::now())
            }
        })
    }

    async fn mutate(&self, section: Section, mutation: Mutation) -> Result<Option<Value>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Make sure there is a row to lock.
        sqlx::query(
            r#"
            INSERT INTO portfolio_sections (key, content, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(section.as_str())
        .bind(defaults::section(section, Utc::now()))
        .execute(&mut *tx)
        .await?;

        let (current,): (Value,) = sqlx::query_as(
            "SELECT content FROM portfolio_sections WHERE key = $1 FOR UPDATE",
        )
        .bind(section.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let applied = content::apply(section, &current, mutation)?;

        if applied.affected.is_some() {
            sqlx::query(
                "UPDATE portfolio_sections SET content = $2, updated_at = now() WHERE key = $1",
            )
            .bind(section.as_str())
            .bind(&applied.value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(applied.affected)
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(self.pool.as_ref()).await?;
        Ok(start.elapsed())
    }
}
