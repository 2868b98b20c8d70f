use std::sync::Arc;

use chrono::FixedOffset;

use crate::errors::BookingError;
use crate::models::{AppointmentSlot, NewCalendarEvent};
use crate::services::calendar::CalendarService;

pub struct CalendarEventWriter {
    calendar: Arc<dyn CalendarService>,
    calendar_id: String,
    offset: FixedOffset,
    time_zone: String,
}

impl CalendarEventWriter {
    pub fn new(
        calendar: Arc<dyn CalendarService>,
        calendar_id: String,
        offset: FixedOffset,
        time_zone: String,
    ) -> Self {
        Self {
            calendar,
            calendar_id,
            offset,
            time_zone,
        }
    }

    /// Persists the reservation and returns the calendar's event id.
    ///
    /// Callers must clear the slot with the duplicate checker first; the two
    /// calls are not atomic against the calendar.
    pub async fn create(
        &self,
        name: &str,
        specialist: &str,
        symptoms: &str,
        slot: &AppointmentSlot,
        requires_confirmation: bool,
    ) -> Result<String, BookingError> {
        let event = NewCalendarEvent::reservation(
            name,
            specialist,
            symptoms,
            slot,
            requires_confirmation,
            self.offset,
            &self.time_zone,
        );

        let event_id = self
            .calendar
            .insert(&self.calendar_id, &event)
            .await
            .map_err(|e| BookingError::TransientService(format!("{e:#}")))?;

        if event_id.trim().is_empty() {
            return Err(BookingError::TransientService(
                "calendar returned an empty event id".to_string(),
            ));
        }

        tracing::info!(
            event_id = %event_id,
            specialist,
            requires_confirmation,
            "reservation created"
        );

        Ok(event_id)
    }
}
