use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use loadline_core::{BookingResult, Load, LoadId, LoadRepository, RepositoryError};

use super::{LoadFilters, LoadSearch};
use crate::DbPool;

const LOAD_COLUMNS: &str = "load_id, origin, destination, equipment_type, listed_rate, booked, \
                            agreed_rate, pickup_at, delivery_at, weight_lbs, commodity, \
                            num_pieces, miles, dimensions, notes";

pub struct SqlLoadRepository {
    pool: DbPool,
}

impl SqlLoadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Upsert a load row; used by seeding and tests, not by negotiation.
    pub async fn insert(&self, load: &Load) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO loads (load_id, origin, destination, equipment_type, listed_rate,
                                booked, agreed_rate, pickup_at, delivery_at, weight_lbs,
                                commodity, num_pieces, miles, dimensions, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(load_id) DO UPDATE SET
                 origin = excluded.origin,
                 destination = excluded.destination,
                 equipment_type = excluded.equipment_type,
                 listed_rate = excluded.listed_rate,
                 booked = excluded.booked,
                 agreed_rate = excluded.agreed_rate,
                 pickup_at = excluded.pickup_at,
                 delivery_at = excluded.delivery_at,
                 weight_lbs = excluded.weight_lbs,
                 commodity = excluded.commodity,
                 num_pieces = excluded.num_pieces,
                 miles = excluded.miles,
                 dimensions = excluded.dimensions,
                 notes = excluded.notes",
        )
        .bind(&load.load_id.0)
        .bind(&load.origin)
        .bind(&load.destination)
        .bind(&load.equipment_type)
        .bind(load.listed_rate.to_string())
        .bind(load.booked)
        .bind(load.agreed_rate.map(|rate| rate.to_string()))
        .bind(load.pickup_at.map(|at| at.to_rfc3339()))
        .bind(load.delivery_at.map(|at| at.to_rfc3339()))
        .bind(load.weight_lbs)
        .bind(&load.commodity)
        .bind(load.num_pieces)
        .bind(load.miles)
        .bind(&load.dimensions)
        .bind(&load.notes)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }
}

fn unavailable(error: sqlx::Error) -> RepositoryError {
    RepositoryError::Unavailable(error.to_string())
}

fn parse_rate(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value)
        .map_err(|error| RepositoryError::Decode(format!("{field}: `{value}`: {error}")))
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Utc))
}

fn row_to_load(row: &sqlx::sqlite::SqliteRow) -> Result<Load, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

    let load_id: String = row.try_get("load_id").map_err(decode)?;
    let listed_rate_raw: String = row.try_get("listed_rate").map_err(decode)?;
    let agreed_rate_raw: Option<String> = row.try_get("agreed_rate").map_err(decode)?;
    let pickup_at_raw: Option<String> = row.try_get("pickup_at").map_err(decode)?;
    let delivery_at_raw: Option<String> = row.try_get("delivery_at").map_err(decode)?;

    let agreed_rate = agreed_rate_raw
        .as_deref()
        .map(|raw| parse_rate("agreed_rate", raw))
        .transpose()?;

    Ok(Load {
        load_id: LoadId(load_id),
        origin: row.try_get("origin").map_err(decode)?,
        destination: row.try_get("destination").map_err(decode)?,
        equipment_type: row.try_get("equipment_type").map_err(decode)?,
        listed_rate: parse_rate("listed_rate", &listed_rate_raw)?,
        booked: row.try_get("booked").map_err(decode)?,
        agreed_rate,
        pickup_at: parse_timestamp(pickup_at_raw),
        delivery_at: parse_timestamp(delivery_at_raw),
        weight_lbs: row.try_get("weight_lbs").map_err(decode)?,
        commodity: row.try_get("commodity").map_err(decode)?,
        num_pieces: row.try_get("num_pieces").map_err(decode)?,
        miles: row.try_get("miles").map_err(decode)?,
        dimensions: row.try_get("dimensions").map_err(decode)?,
        notes: row.try_get("notes").map_err(decode)?,
    })
}

#[async_trait]
impl LoadRepository for SqlLoadRepository {
    async fn get(&self, load_id: &LoadId) -> Result<Option<Load>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {LOAD_COLUMNS} FROM loads WHERE load_id = ?"))
            .bind(&load_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        match row {
            Some(ref r) => Ok(Some(row_to_load(r)?)),
            None => Ok(None),
        }
    }

    async fn conditional_book(
        &self,
        load_id: &LoadId,
        agreed_rate: Decimal,
    ) -> Result<BookingResult, RepositoryError> {
        // Compare-and-set: only an unbooked row matches, so exactly one of
        // any number of racing committers observes a row change.
        let result = sqlx::query(
            "UPDATE loads SET booked = 1, agreed_rate = ? WHERE load_id = ? AND booked = 0",
        )
        .bind(agreed_rate.to_string())
        .bind(&load_id.0)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 1 {
            Ok(BookingResult::Committed)
        } else {
            Ok(BookingResult::AlreadyBooked)
        }
    }
}

#[async_trait]
impl LoadSearch for SqlLoadRepository {
    async fn search(&self, filters: &LoadFilters) -> Result<Vec<Load>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {LOAD_COLUMNS} FROM loads
             WHERE booked = 0
               AND origin LIKE ?
               AND destination LIKE ?
               AND equipment_type LIKE ?
             ORDER BY load_id",
        ))
        .bind(like_pattern(&filters.origin))
        .bind(like_pattern(&filters.destination))
        .bind(like_pattern(&filters.equipment_type))
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.iter().map(row_to_load).collect()
    }
}

fn like_pattern(value: &str) -> String {
    format!("%{}%", value.trim())
}
