pub mod google;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{CalendarEvent, NewCalendarEvent};

#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Persists `event` and returns the id assigned by the calendar.
    async fn insert(&self, calendar_id: &str, event: &NewCalendarEvent) -> anyhow::Result<String>;

    /// Events overlapping `[time_min, time_max]` whose text matches `query`.
    async fn list(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        query: &str,
    ) -> anyhow::Result<Vec<CalendarEvent>>;
}
