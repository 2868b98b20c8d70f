use std::sync::Arc;

use crate::models::calendar_event::duplicate_query;
use crate::models::AppointmentSlot;
use crate::services::calendar::CalendarService;

pub struct DuplicateChecker {
    calendar: Arc<dyn CalendarService>,
    calendar_id: String,
}

impl DuplicateChecker {
    pub fn new(calendar: Arc<dyn CalendarService>, calendar_id: String) -> Self {
        Self {
            calendar,
            calendar_id,
        }
    }

    /// Whether `name` already holds a reservation overlapping `slot`.
    ///
    /// Fails open: a calendar read error is logged and reported as "no duplicate"
    /// so a flaky read never blocks a booking.
    pub async fn exists(&self, name: &str, slot: &AppointmentSlot) -> bool {
        let events = match self
            .calendar
            .list(&self.calendar_id, slot.start, slot.end, &duplicate_query(name))
            .await
        {
            Ok(events) => events,
            Err(e) => {
                tracing::error!(error = %e, name, "duplicate check failed, assuming none");
                return false;
            }
        };

        events.iter().any(|event| {
            event.is_reservation_for(name)
                && event
                    .slot()
                    .map(|existing| slot.overlaps(existing.start, existing.end))
                    .unwrap_or(true)
        })
    }
}
