use chrono::FixedOffset;

use crate::errors::BookingError;
use crate::models::{AppointmentRequest, BookingOutcome, DispatchStatus};
use crate::services::confirmation::ConfirmationDispatcher;
use crate::services::duplicates::DuplicateChecker;
use crate::services::event_writer::CalendarEventWriter;
use crate::services::routing::SpecialistRouter;

pub const DUPLICATE_MESSAGE: &str =
    "У вас уже есть активная запись. Пожалуйста, дождитесь подтверждения.";
pub const FAILED_MESSAGE: &str = "Ошибка при создании записи. Пожалуйста, попробуйте позже.";

pub struct BookingOrchestrator {
    duplicates: DuplicateChecker,
    router: Box<dyn SpecialistRouter>,
    writer: CalendarEventWriter,
    dispatcher: ConfirmationDispatcher,
    requires_confirmation: bool,
    offset: FixedOffset,
}

impl BookingOrchestrator {
    pub fn new(
        duplicates: DuplicateChecker,
        router: Box<dyn SpecialistRouter>,
        writer: CalendarEventWriter,
        dispatcher: ConfirmationDispatcher,
        requires_confirmation: bool,
        offset: FixedOffset,
    ) -> Self {
        Self {
            duplicates,
            router,
            writer,
            dispatcher,
            requires_confirmation,
            offset,
        }
    }

    pub async fn book(&self, request: &AppointmentRequest) -> BookingOutcome {
        match self.try_book(request).await {
            Ok(outcome) => outcome,
            Err(BookingError::DuplicateBooking(name)) => {
                tracing::info!(name = %name, "duplicate booking rejected");
                BookingOutcome::Duplicate
            }
            Err(e) => {
                tracing::error!(error = %e, name = %request.name, "booking failed");
                BookingOutcome::Failed
            }
        }
    }

    async fn try_book(&self, request: &AppointmentRequest) -> Result<BookingOutcome, BookingError> {
        let slot = request.slot();

        if self.duplicates.exists(&request.name, &slot).await {
            return Err(BookingError::DuplicateBooking(request.name.clone()));
        }

        let specialist = self.router.route(&request.symptoms)?;

        let event_id = self
            .writer
            .create(
                &request.name,
                &specialist,
                &request.symptoms,
                &slot,
                self.requires_confirmation,
            )
            .await?;

        if !self.requires_confirmation {
            return Ok(BookingOutcome::Booked {
                event_id,
                specialist,
                slot,
            });
        }

        // The reservation stands even if nobody hears about it.
        let dispatch = match self.dispatcher.notify(&event_id).await {
            Ok(status) => status,
            Err(BookingError::DispatchExhausted { attempts, .. }) => {
                DispatchStatus::Exhausted { attempts }
            }
            Err(e) => {
                tracing::error!(error = %e, event_id = %event_id, "confirmation dispatch failed");
                DispatchStatus::Exhausted { attempts: 0 }
            }
        };

        Ok(BookingOutcome::PendingConfirmation {
            event_id,
            specialist,
            slot,
            dispatch,
        })
    }

    pub fn render(&self, outcome: &BookingOutcome) -> String {
        render_outcome(outcome, self.offset)
    }
}

pub fn render_outcome(outcome: &BookingOutcome, offset: FixedOffset) -> String {
    match outcome {
        BookingOutcome::Booked {
            specialist, slot, ..
        } => format!(
            "Запись к {specialist} на {} оформлена.",
            slot.display_start(offset)
        ),
        BookingOutcome::PendingConfirmation {
            specialist, slot, ..
        } => format!(
            "Предварительная запись к {specialist} на {} создана. Ожидайте подтверждения.",
            slot.display_start(offset)
        ),
        BookingOutcome::Duplicate => DUPLICATE_MESSAGE.to_string(),
        BookingOutcome::Failed => FAILED_MESSAGE.to_string(),
    }
}
