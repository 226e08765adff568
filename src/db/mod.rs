pub mod migrations;
pub mod queries;
pub mod sqlite;

use anyhow::Context;
use async_trait::async_trait;
use rusqlite::Connection;

use crate::errors::StorageError;
use crate::models::{Booking, BookingStatus, ConversationContext};

pub use sqlite::SqliteStore;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Per-phone conversation contexts.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Stored context, or a fresh Idle context if none exists.
    async fn get(&self, phone: &str) -> Result<ConversationContext, StorageError>;
    async fn put(&self, phone: &str, ctx: &ConversationContext) -> Result<(), StorageError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persist `booking`, returning its code. Fails with
    /// [`StorageError::DuplicateCode`] if the code is taken.
    async fn create(&self, booking: &Booking) -> Result<String, StorageError>;
    async fn record_payment_proof(
        &self,
        code: &str,
        media_ref: &str,
        note: Option<&str>,
    ) -> Result<(), StorageError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Booking>, StorageError>;
    async fn update_status(&self, code: &str, status: BookingStatus) -> Result<(), StorageError>;
    async fn list(
        &self,
        status_filter: Option<BookingStatus>,
        limit: i64,
    ) -> Result<Vec<Booking>, StorageError>;
}
