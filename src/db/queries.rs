use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{ffi, params, Connection, ErrorCode};

use crate::errors::StorageError;
use crate::models::{
    Booking, BookingStatus, ConversationContext, ConversationState, PartialBooking, PricingResult,
    VehicleType,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_ts(value: &str) -> Result<NaiveDateTime, StorageError> {
    NaiveDateTime::parse_from_str(value, TS_FORMAT)
        .map_err(|e| StorageError::Corrupt(format!("timestamp {value:?}: {e}")))
}

// ── Conversations ──

pub fn get_conversation(conn: &Connection, phone: &str) -> Result<Option<ConversationContext>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT phone, state, partial_booking, current_booking_id, updated_at
         FROM conversations WHERE phone = ?1",
    )?;

    let result = stmt.query_row(params![phone], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
        ))
    });

    match result {
        Ok((phone, state_str, partial_json, current_booking_id, updated_at_str)) => {
            let state = ConversationState::parse(&state_str)
                .ok_or_else(|| StorageError::Corrupt(format!("conversation state {state_str:?}")))?;
            let partial_booking: PartialBooking = serde_json::from_str(&partial_json)?;

            Ok(Some(ConversationContext {
                phone,
                state,
                partial_booking,
                current_booking_id,
                updated_at: parse_ts(&updated_at_str)?,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_conversation(conn: &Connection, ctx: &ConversationContext) -> Result<(), StorageError> {
    let partial_json = serde_json::to_string(&ctx.partial_booking)?;
    let updated_at = ctx.updated_at.format(TS_FORMAT).to_string();

    conn.execute(
        "INSERT INTO conversations (phone, state, partial_booking, current_booking_id, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(phone) DO UPDATE SET
           state = excluded.state,
           partial_booking = excluded.partial_booking,
           current_booking_id = excluded.current_booking_id,
           updated_at = excluded.updated_at",
        params![
            ctx.phone,
            ctx.state.as_str(),
            partial_json,
            ctx.current_booking_id,
            updated_at
        ],
    )?;
    Ok(())
}

/// Delete idle rows last touched at or before `older_than`. Rows still linked
/// to a booking are kept.
pub fn expire_conversations(conn: &Connection, older_than: &NaiveDateTime) -> Result<usize, StorageError> {
    let cutoff = older_than.format(TS_FORMAT).to_string();
    let count = conn.execute(
        "DELETE FROM conversations WHERE updated_at <= ?1 AND current_booking_id IS NULL",
        params![cutoff],
    )?;
    Ok(count)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "booking_code, client_phone, pickup_location, destination, vehicle_type, \
     pickup_date, corridor_key, distance_km, nights, pricing, status, payment_proof_url, \
     payment_notes, created_at, updated_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> Result<(), StorageError> {
    let pricing_json = serde_json::to_string(&booking.pricing)?;

    let result = conn.execute(
        "INSERT INTO bookings (booking_code, client_phone, pickup_location, destination, vehicle_type,
            pickup_date, corridor_key, distance_km, nights, pricing, customer_total_minor,
            driver_payout_minor, commission_minor, currency, status, payment_proof_url,
            payment_notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            booking.booking_code,
            booking.client_phone,
            booking.pickup_location,
            booking.destination,
            booking.vehicle_type.as_str(),
            booking.pickup_date.format(DATE_FORMAT).to_string(),
            booking.corridor_key,
            booking.distance_km,
            booking.nights,
            pricing_json,
            booking.pricing.customer_total.minor,
            booking.pricing.driver_payout.minor,
            booking.pricing.commission_amount.minor,
            booking.pricing.customer_total.currency.as_str(),
            booking.status.as_str(),
            booking.payment_proof_url,
            booking.payment_notes,
            booking.created_at.format(TS_FORMAT).to_string(),
            booking.updated_at.format(TS_FORMAT).to_string(),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation
                && matches!(
                    err.extended_code,
                    ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
                ) =>
        {
            Err(StorageError::DuplicateCode(booking.booking_code.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_booking(conn: &Connection, code: &str) -> Result<Option<Booking>, StorageError> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_code = ?1"),
        params![code],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    limit: i64,
) -> Result<Vec<Booking>, StorageError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY created_at DESC, booking_code DESC LIMIT ?2"
    ))?;

    let rows = stmt.query_map(
        params![status_filter.map(|s| s.as_str()), limit],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    code: &str,
    status: BookingStatus,
) -> Result<bool, StorageError> {
    let now = Utc::now().naive_utc().format(TS_FORMAT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE booking_code = ?3",
        params![status.as_str(), now, code],
    )?;
    Ok(count > 0)
}

pub fn record_payment_proof(
    conn: &Connection,
    code: &str,
    media_url: &str,
    note: Option<&str>,
) -> Result<bool, StorageError> {
    let now = Utc::now().naive_utc().format(TS_FORMAT).to_string();
    let count = conn.execute(
        "UPDATE bookings
         SET payment_proof_url = ?1, payment_notes = ?2, status = ?3, updated_at = ?4
         WHERE booking_code = ?5",
        params![
            media_url,
            note,
            BookingStatus::PaymentSubmitted.as_str(),
            now,
            code
        ],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> Result<Booking, StorageError> {
    let booking_code: String = row.get(0)?;
    let vehicle_str: String = row.get(4)?;
    let pickup_date_str: String = row.get(5)?;
    let pricing_json: String = row.get(9)?;
    let status_str: String = row.get(10)?;
    let created_at_str: String = row.get(13)?;
    let updated_at_str: String = row.get(14)?;

    let vehicle_type = VehicleType::parse(&vehicle_str)
        .ok_or_else(|| StorageError::Corrupt(format!("vehicle type {vehicle_str:?}")))?;
    let pickup_date = NaiveDate::parse_from_str(&pickup_date_str, DATE_FORMAT)
        .map_err(|e| StorageError::Corrupt(format!("pickup date {pickup_date_str:?}: {e}")))?;
    let pricing: PricingResult = serde_json::from_str(&pricing_json)?;
    let status = BookingStatus::parse(&status_str)
        .ok_or_else(|| StorageError::Corrupt(format!("booking status {status_str:?}")))?;

    Ok(Booking {
        booking_code,
        client_phone: row.get(1)?,
        pickup_location: row.get(2)?,
        destination: row.get(3)?,
        vehicle_type,
        pickup_date,
        corridor_key: row.get(6)?,
        distance_km: row.get(7)?,
        nights: row.get(8)?,
        pricing,
        status,
        payment_proof_url: row.get(11)?,
        payment_notes: row.get(12)?,
        created_at: parse_ts(&created_at_str)?,
        updated_at: parse_ts(&updated_at_str)?,
    })
}
