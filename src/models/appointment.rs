use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

pub const LEAD_TIME_HOURS: i64 = 3;
pub const SLOT_MINUTES: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRequest {
    pub name: String,
    pub symptoms: String,
    pub requested_at: DateTime<Utc>,
}

impl AppointmentRequest {
    pub fn slot(&self) -> AppointmentSlot {
        AppointmentSlot::for_request(self.requested_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AppointmentSlot {
    pub fn for_request(requested_at: DateTime<Utc>) -> Self {
        let start = requested_at + Duration::hours(LEAD_TIME_HOURS);
        Self {
            start,
            end: start + Duration::minutes(SLOT_MINUTES),
        }
    }

    /// Half-open overlap: a slot ending exactly when another starts does not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }

    /// `dd.mm.yyyy HH:MM` in the calendar's local offset.
    pub fn display_start(&self, offset: FixedOffset) -> String {
        self.start
            .with_timezone(&offset)
            .format("%d.%m.%Y %H:%M")
            .to_string()
    }
}
