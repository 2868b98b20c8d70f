use serde::Serialize;

use super::AppointmentSlot;

/// Terminal state of one booking transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BookingOutcome {
    Booked {
        event_id: String,
        specialist: String,
        slot: AppointmentSlot,
    },
    PendingConfirmation {
        event_id: String,
        specialist: String,
        slot: AppointmentSlot,
        dispatch: DispatchStatus,
    },
    Duplicate,
    Failed,
}

impl BookingOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingOutcome::Booked { .. } => "booked",
            BookingOutcome::PendingConfirmation { .. } => "pending_confirmation",
            BookingOutcome::Duplicate => "duplicate",
            BookingOutcome::Failed => "failed",
        }
    }

    pub fn event_id(&self) -> Option<&str> {
        match self {
            BookingOutcome::Booked { event_id, .. }
            | BookingOutcome::PendingConfirmation { event_id, .. } => Some(event_id),
            BookingOutcome::Duplicate | BookingOutcome::Failed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchStatus {
    Delivered { attempts: u32 },
    Skipped,
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Rejected(u16),
    NetworkError(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookDeliveryAttempt {
    pub event_id: String,
    pub attempt_number: u32,
    pub outcome: DeliveryOutcome,
}
