use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use loadline_core::{
    BookingResult, CallLogEntry, CallLogId, CallLogSink, CallOutcomeNotice, Load, LoadId,
    LoadRepository, NewCallLog, RepositoryError,
};

use super::{CallLogRepository, LoadFilters, LoadSearch};

#[derive(Default)]
pub struct InMemoryLoadRepository {
    loads: RwLock<HashMap<String, Load>>,
}

impl InMemoryLoadRepository {
    pub async fn insert(&self, load: Load) {
        let mut loads = self.loads.write().await;
        loads.insert(load.load_id.0.clone(), load);
    }
}

#[async_trait::async_trait]
impl LoadRepository for InMemoryLoadRepository {
    async fn get(&self, load_id: &LoadId) -> Result<Option<Load>, RepositoryError> {
        let loads = self.loads.read().await;
        Ok(loads.get(&load_id.0).cloned())
    }

    async fn conditional_book(
        &self,
        load_id: &LoadId,
        agreed_rate: Decimal,
    ) -> Result<BookingResult, RepositoryError> {
        let mut loads = self.loads.write().await;
        match loads.get_mut(&load_id.0) {
            Some(load) if !load.booked => {
                load.booked = true;
                load.agreed_rate = Some(agreed_rate);
                Ok(BookingResult::Committed)
            }
            _ => Ok(BookingResult::AlreadyBooked),
        }
    }
}

#[async_trait::async_trait]
impl LoadSearch for InMemoryLoadRepository {
    async fn search(&self, filters: &LoadFilters) -> Result<Vec<Load>, RepositoryError> {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_ascii_lowercase().contains(&needle.trim().to_ascii_lowercase())
        };

        let loads = self.loads.read().await;
        let mut matches: Vec<Load> = loads
            .values()
            .filter(|load| !load.booked)
            .filter(|load| contains(&load.origin, &filters.origin))
            .filter(|load| contains(&load.destination, &filters.destination))
            .filter(|load| contains(&load.equipment_type, &filters.equipment_type))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.load_id.0.cmp(&b.load_id.0));
        Ok(matches)
    }
}

#[derive(Default)]
pub struct InMemoryCallLogRepository {
    entries: RwLock<Vec<CallLogEntry>>,
}

#[async_trait::async_trait]
impl CallLogRepository for InMemoryCallLogRepository {
    async fn create(&self, new_entry: NewCallLog) -> Result<CallLogEntry, RepositoryError> {
        let mut entries = self.entries.write().await;
        let entry = CallLogEntry {
            call_id: CallLogId(format!("CL-{:04}", entries.len() + 1)),
            load_id: new_entry.load_id,
            call_started_at: new_entry.call_started_at,
            sentiment: new_entry.sentiment,
            outcome: new_entry.outcome,
            round_count: new_entry.round_count,
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn find_by_id(
        &self,
        call_id: &CallLogId,
    ) -> Result<Option<CallLogEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|entry| &entry.call_id == call_id).cloned())
    }

    async fn list(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<CallLogEntry>, u64), RepositoryError> {
        let entries = self.entries.read().await;
        let mut sorted: Vec<CallLogEntry> = entries.clone();
        sorted.sort_by(|a, b| b.call_started_at.cmp(&a.call_started_at));
        let page =
            sorted.into_iter().skip(offset as usize).take(limit as usize).collect();
        Ok((page, entries.len() as u64))
    }

    async fn fetch_recent(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<CallLogEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        let mut sorted: Vec<CallLogEntry> = entries.clone();
        sorted.sort_by(|a, b| b.call_started_at.cmp(&a.call_started_at));
        match limit {
            Some(limit) => Ok(sorted.into_iter().take(limit as usize).collect()),
            None => Ok(sorted),
        }
    }
}

#[async_trait::async_trait]
impl CallLogSink for InMemoryCallLogRepository {
    async fn record(&self, notice: CallOutcomeNotice) -> Result<(), RepositoryError> {
        self.create(NewCallLog {
            load_id: notice.load_id,
            call_started_at: Utc::now(),
            sentiment: None,
            outcome: notice.outcome.as_str().to_string(),
            round_count: Some(notice.round_count),
        })
        .await
        .map(|_| ())
    }
}
