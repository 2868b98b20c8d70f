pub mod appointment;
pub mod booking;
pub mod calendar_event;
pub mod conversation;

pub use appointment::{AppointmentRequest, AppointmentSlot};
pub use booking::{BookingOutcome, DeliveryOutcome, DispatchStatus, WebhookDeliveryAttempt};
pub use calendar_event::{CalendarEvent, EventDateTime, NewCalendarEvent};
pub use conversation::{ConversationState, IntakeStep};
