//! SQLite persistence collaborator for mission documents.
//!
//! Missions are stored as JSON documents with the classification fields
//! (organization, status, funded status, group) denormalized into indexed
//! columns on every write, so view queries stay SQL predicates. A row
//! whose `record` column is NULL or empty is the "document exists but
//! carries no payload" condition and surfaces as [`MissionError::NoData`].
//!
//! Writes are last-writer-wins per delta; no retries and no local
//! recovery. Collaborator failures surface as
//! [`MissionError::Persistence`] unchanged.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::{
    domain::{Mission, MissionId, MissionStatus, OrganizationId},
    error::MissionError,
    lifecycle::{apply_delta, TransitionDelta},
    protocol::DeliveryReport,
    views::MissionView,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts a new mission, force-setting the uid to a store-issued
    /// identifier and the creation timestamp to now. Field contents are
    /// taken as supplied; sanitization happens in the service layer.
    pub async fn create_mission(&self, mut mission: Mission) -> Result<Mission, MissionError> {
        mission.uid = MissionId::new(Uuid::new_v4().to_string());
        mission.created_at = Utc::now();

        let record = encode_document(&mission)?;
        sqlx::query(
            "INSERT INTO missions (uid, organization_uid, status, funded_status, group_uid, record)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(mission.uid.as_str())
        .bind(mission.organization_uid.as_str())
        .bind(mission.status.as_str())
        .bind(mission.funded_status.as_str())
        .bind(mission.group_uid.as_str())
        .bind(&record)
        .execute(&self.pool)
        .await
        .context("insert mission")?;

        Ok(mission)
    }

    pub async fn get_mission(&self, mission_uid: &MissionId) -> Result<Mission, MissionError> {
        let row = sqlx::query("SELECT record FROM missions WHERE uid = ?")
            .bind(mission_uid.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("fetch mission")?;

        let Some(row) = row else {
            return Err(MissionError::NotFound(mission_uid.clone()));
        };
        decode_document(mission_uid, row.get::<Option<String>, _>(0))
    }

    /// Loads the addressed mission, replaces status and both volunteer
    /// slots from the delta, and rewrites document plus denormalized
    /// columns. Fails NotFound/NoData exactly like a read.
    pub async fn apply_transition(&self, delta: &TransitionDelta) -> Result<Mission, MissionError> {
        let mut mission = self.get_mission(&delta.mission_uid).await?;
        apply_delta(&mut mission, delta);
        self.write_mission(&mission).await?;
        Ok(mission)
    }

    /// Merges post-delivery fields into the stored document. Only fields
    /// present in the report are touched.
    pub async fn annotate_delivery(
        &self,
        mission_uid: &MissionId,
        report: &DeliveryReport,
    ) -> Result<Mission, MissionError> {
        let mut mission = self.get_mission(mission_uid).await?;
        if let Some(image) = &report.confirmation_image {
            mission.delivery_confirmation_image = image.clone();
        }
        if let Some(notes) = &report.delivery_notes {
            mission.delivery_notes = notes.clone();
        }
        if let Some(notes) = &report.feedback_notes {
            mission.feedback_notes = notes.clone();
        }
        self.write_mission(&mission).await?;
        Ok(mission)
    }

    /// Pre-filtered collection for a named view; the view's status list
    /// and funded constraint are used verbatim as the query descriptor.
    pub async fn list_view(
        &self,
        organization_uid: &OrganizationId,
        view: MissionView,
    ) -> Result<Vec<Mission>, MissionError> {
        let statuses = view.statuses();
        let placeholders = vec!["?"; statuses.len()].join(", ");
        let mut sql = format!(
            "SELECT uid, record FROM missions
             WHERE organization_uid = ? AND status IN ({placeholders})"
        );
        if view.funded_constraint().is_some() {
            sql.push_str(" AND funded_status = ?");
        }
        sql.push_str(" ORDER BY rowid ASC");

        let mut query = sqlx::query(&sql).bind(organization_uid.as_str());
        for status in statuses {
            query = query.bind(status.as_str());
        }
        if let Some(funded) = view.funded_constraint() {
            query = query.bind(funded.as_str());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("query mission view")?;
        rows.into_iter()
            .map(|row| {
                let uid = MissionId::new(row.get::<String, _>(0));
                decode_document(&uid, row.get::<Option<String>, _>(1))
            })
            .collect()
    }

    /// The pool `accept` is driven from: the organization's tentative
    /// missions, in creation order.
    pub async fn list_available(
        &self,
        organization_uid: &OrganizationId,
    ) -> Result<Vec<Mission>, MissionError> {
        let rows = sqlx::query(
            "SELECT uid, record FROM missions
             WHERE organization_uid = ? AND status = ?
             ORDER BY rowid ASC",
        )
        .bind(organization_uid.as_str())
        .bind(MissionStatus::Tentative.as_str())
        .fetch_all(&self.pool)
        .await
        .context("query available missions")?;

        rows.into_iter()
            .map(|row| {
                let uid = MissionId::new(row.get::<String, _>(0));
                decode_document(&uid, row.get::<Option<String>, _>(1))
            })
            .collect()
    }

    pub async fn list_for_organization(
        &self,
        organization_uid: &OrganizationId,
    ) -> Result<Vec<Mission>, MissionError> {
        let rows = sqlx::query(
            "SELECT uid, record FROM missions WHERE organization_uid = ? ORDER BY rowid ASC",
        )
        .bind(organization_uid.as_str())
        .fetch_all(&self.pool)
        .await
        .context("query organization missions")?;

        rows.into_iter()
            .map(|row| {
                let uid = MissionId::new(row.get::<String, _>(0));
                decode_document(&uid, row.get::<Option<String>, _>(1))
            })
            .collect()
    }

    async fn write_mission(&self, mission: &Mission) -> Result<(), MissionError> {
        let record = encode_document(mission)?;
        sqlx::query(
            "UPDATE missions
             SET status = ?, funded_status = ?, group_uid = ?, record = ?
             WHERE uid = ?",
        )
        .bind(mission.status.as_str())
        .bind(mission.funded_status.as_str())
        .bind(mission.group_uid.as_str())
        .bind(&record)
        .bind(mission.uid.as_str())
        .execute(&self.pool)
        .await
        .context("update mission")?;
        Ok(())
    }
}

fn encode_document(mission: &Mission) -> Result<String, MissionError> {
    Ok(serde_json::to_string(mission).context("encode mission document")?)
}

fn decode_document(uid: &MissionId, record: Option<String>) -> Result<Mission, MissionError> {
    match record {
        Some(raw) if !raw.is_empty() => {
            Ok(serde_json::from_str(&raw).context("decode mission document")?)
        }
        _ => Err(MissionError::NoData(uid.clone())),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };
    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
