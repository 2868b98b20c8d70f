pub mod ai;
pub mod booking;
pub mod calendar;
pub mod confirmation;
pub mod conversation;
pub mod duplicates;
pub mod event_writer;
pub mod routing;
