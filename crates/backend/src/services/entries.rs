//! Entry lookup, saving and the month calendar.

use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use shared_types::{DateEntry, Entry, EntryDatesResponse};
use thiserror::Error;
use uuid::Uuid;

use crate::dates::{
    beginning_of_next_month, beginning_of_previous_month, date_string, date_string_of, days_in,
    today_string_at,
};
use crate::repository::EntryStore;

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("Past entries are not editable")]
    NotEditable,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub async fn find_entry(store: &dyn EntryStore, user_id: Uuid, date: &str) -> Result<Option<Entry>> {
    store
        .find(user_id, date)
        .await
        .with_context(|| format!("Failed to load entry for {}", date))
}

/// Replace the body of `date`'s entry. Only `today` may be written.
pub async fn save_entry(
    store: &dyn EntryStore,
    user_id: Uuid,
    date: &str,
    body: &str,
    today: &str,
) -> Result<Entry, EntryError> {
    if date != today {
        return Err(EntryError::NotEditable);
    }

    let entry = store
        .upsert(user_id, date, body)
        .await
        .with_context(|| format!("Failed to save entry for {}", date))?;
    tracing::info!("Saved entry {} for user {}", date, user_id);
    Ok(entry)
}

/// One marker per day of `reference`'s month, in order.
///
/// `is_future` compares the day of month against `now` in UTC rather than
/// comparing instants, so days around local midnight can be misclassified.
pub async fn find_entry_dates(
    store: &dyn EntryStore,
    user_id: Uuid,
    reference: DateTime<Tz>,
    now: DateTime<Utc>,
) -> Result<Vec<DateEntry>> {
    let (year, month) = (reference.year(), reference.month());
    let days = days_in(year, month);

    let from = date_string(year, month, 1);
    let to = date_string(year, month, days);
    let existing: HashSet<String> = store
        .find_by_date_range(user_id, Some(&from), Some(&to))
        .await
        .context("Failed to load entry dates")?
        .into_iter()
        .map(|entry| entry.date)
        .collect();

    let dates = (1..=days)
        .map(|day| {
            let date = date_string(year, month, day);
            let is_future = if (year, month) == (now.year(), now.month()) {
                day > now.day()
            } else {
                (year, month) > (now.year(), now.month())
            };
            DateEntry {
                has_entry: existing.contains(&date),
                date,
                is_future,
            }
        })
        .collect();

    Ok(dates)
}

/// Calendar view for the month containing `reference`.
///
/// `next_month` is only offered once that month has started.
pub async fn month_calendar(
    store: &dyn EntryStore,
    user_id: Uuid,
    reference: DateTime<Tz>,
    now: DateTime<Utc>,
) -> Result<EntryDatesResponse> {
    let entry_dates = find_entry_dates(store, user_id, reference, now).await?;

    let previous = beginning_of_previous_month(&reference);
    let next = beginning_of_next_month(&reference);
    let next_month = if next.with_timezone(&Utc) <= now {
        Some(date_string_of(&next))
    } else {
        None
    };

    Ok(EntryDatesResponse {
        entry_dates,
        today: today_string_at(now, reference.timezone()),
        previous_month: date_string_of(&previous),
        next_month,
    })
}
