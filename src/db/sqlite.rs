use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use rusqlite::Connection;

use super::{queries, BookingRepository, ConversationStore};
use crate::errors::StorageError;
use crate::models::{Booking, BookingStatus, ConversationContext};

/// SQLite-backed conversation store and booking repository.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    ttl: Duration,
}

impl SqliteStore {
    pub fn new(conn: Connection, ttl_hours: i64) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl: Duration::hours(ttl_hours),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cutoff(&self) -> NaiveDateTime {
        Utc::now().naive_utc() - self.ttl
    }

    /// Delete conversations idle for longer than the TTL that hold no booking.
    pub fn purge_expired(&self) -> Result<usize, StorageError> {
        let cutoff = self.cutoff();
        queries::expire_conversations(&self.conn(), &cutoff)
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn get(&self, phone: &str) -> Result<ConversationContext, StorageError> {
        let stored = queries::get_conversation(&self.conn(), phone)?;
        let Some(mut ctx) = stored else {
            return Ok(ConversationContext::new(phone, Utc::now().naive_utc()));
        };

        // Abandoned intake starts over; the booking link survives.
        if ctx.updated_at <= self.cutoff() && ctx.state.is_collecting() {
            tracing::debug!(phone = %phone, state = ctx.state.as_str(), "stale conversation reset");
            ctx.reset();
        }
        Ok(ctx)
    }

    async fn put(&self, phone: &str, ctx: &ConversationContext) -> Result<(), StorageError> {
        if ctx.phone != phone {
            return Err(StorageError::Corrupt(format!(
                "context for {} stored under {phone}",
                ctx.phone
            )));
        }
        queries::save_conversation(&self.conn(), ctx)
    }
}

#[async_trait]
impl BookingRepository for SqliteStore {
    async fn create(&self, booking: &Booking) -> Result<String, StorageError> {
        queries::insert_booking(&self.conn(), booking)?;
        Ok(booking.booking_code.clone())
    }

    async fn record_payment_proof(
        &self,
        code: &str,
        media_ref: &str,
        note: Option<&str>,
    ) -> Result<(), StorageError> {
        if queries::record_payment_proof(&self.conn(), code, media_ref, note)? {
            Ok(())
        } else {
            Err(StorageError::NotFound(format!("booking {code}")))
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Booking>, StorageError> {
        queries::get_booking(&self.conn(), code)
    }

    async fn update_status(&self, code: &str, status: BookingStatus) -> Result<(), StorageError> {
        if queries::update_booking_status(&self.conn(), code, status)? {
            Ok(())
        } else {
            Err(StorageError::NotFound(format!("booking {code}")))
        }
    }

    async fn list(
        &self,
        status_filter: Option<BookingStatus>,
        limit: i64,
    ) -> Result<Vec<Booking>, StorageError> {
        queries::list_bookings(&self.conn(), status_filter, limit)
    }
}
