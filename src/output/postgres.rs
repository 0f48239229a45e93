use sqlx::{Connection, PgConnection};
use tracing::{debug, info};

use crate::error::SinkError;
use crate::timeline::MasterTimeline;

pub const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS master_timeline (
        Time TIMESTAMP,
        Source TEXT,
        System TEXT,
        "User" TEXT,
        Description TEXT
    )
"#;

pub const INSERT_EVENT: &str = r#"
    INSERT INTO master_timeline (Time, Source, System, "User", Description)
    VALUES ($1, $2, $3, $4, $5)
"#;

/// PostgreSQL sink. All rows of a run go in one transaction.
#[derive(Debug, Clone)]
pub struct PostgresSink {
    url: String,
}

impl PostgresSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Blocking entry point; drives the insert on a private runtime.
    pub fn write(&self, timeline: &MasterTimeline) -> Result<usize, SinkError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SinkError::Runtime)?;
        runtime.block_on(self.write_async(timeline))
    }

    pub async fn write_async(&self, timeline: &MasterTimeline) -> Result<usize, SinkError> {
        let mut conn = PgConnection::connect(&self.url).await?;
        debug!("Connected to PostgreSQL");

        let mut tx = conn.begin().await?;
        sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;

        for event in timeline {
            sqlx::query(INSERT_EVENT)
                .bind(event.time)
                .bind(&event.source)
                .bind(&event.system)
                .bind(&event.user)
                .bind(&event.description)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        conn.close().await?;

        info!(rows = timeline.len(), "Inserted timeline into PostgreSQL");
        Ok(timeline.len())
    }
}
