use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::AppointmentSlot;

pub const SUMMARY_PREFIX: &str = "Прием:";
const REQUIRES_CONFIRMATION_KEY: &str = "requiresConfirmation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default)]
    pub date_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    pub fn new(at: DateTime<Utc>, offset: FixedOffset, time_zone: &str) -> Self {
        Self {
            date_time: at.with_timezone(&offset).to_rfc3339(),
            time_zone: Some(time_zone.to_string()),
        }
    }

    pub fn parse(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date_time)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    #[serde(default)]
    pub private: HashMap<String, String>,
}

/// Request body for a calendar insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
}

impl NewCalendarEvent {
    pub fn reservation(
        name: &str,
        specialist: &str,
        symptoms: &str,
        slot: &AppointmentSlot,
        requires_confirmation: bool,
        offset: FixedOffset,
        time_zone: &str,
    ) -> Self {
        let extended_properties = requires_confirmation.then(|| ExtendedProperties {
            private: HashMap::from([(
                REQUIRES_CONFIRMATION_KEY.to_string(),
                "true".to_string(),
            )]),
        });

        Self {
            summary: reservation_summary(name, specialist),
            description: format!("Симптомы: {symptoms}"),
            start: EventDateTime::new(slot.start, offset, time_zone),
            end: EventDateTime::new(slot.end, offset, time_zone),
            extended_properties,
        }
    }

    pub fn requires_confirmation(&self) -> bool {
        requires_confirmation(self.extended_properties.as_ref())
    }
}

/// An event as returned by the calendar service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start: Option<EventDateTime>,
    #[serde(default)]
    pub end: Option<EventDateTime>,
    #[serde(default)]
    pub extended_properties: Option<ExtendedProperties>,
}

impl CalendarEvent {
    pub fn slot(&self) -> Option<AppointmentSlot> {
        let start = self.start.as_ref()?.parse()?;
        let end = self.end.as_ref()?.parse()?;
        Some(AppointmentSlot { start, end })
    }

    pub fn requires_confirmation(&self) -> bool {
        requires_confirmation(self.extended_properties.as_ref())
    }

    pub fn is_reservation_for(&self, name: &str) -> bool {
        let Some(rest) = self.summary.strip_prefix(SUMMARY_PREFIX) else {
            return false;
        };
        let booked_name = rest.split_once(',').map(|(n, _)| n).unwrap_or(rest);
        normalize_name(booked_name).to_lowercase() == normalize_name(name).to_lowercase()
    }
}

/// Collapses runs of whitespace so "Иван  Петров" and "Иван Петров" compare equal.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn reservation_summary(name: &str, specialist: &str) -> String {
    format!("{SUMMARY_PREFIX} {name}, {specialist}")
}

/// Free-text query used to look up a patient's reservations.
pub fn duplicate_query(name: &str) -> String {
    format!("{SUMMARY_PREFIX} {name}")
}

fn requires_confirmation(props: Option<&ExtendedProperties>) -> bool {
    props
        .and_then(|p| p.private.get(REQUIRES_CONFIRMATION_KEY))
        .map(|v| v == "true")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moscow() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn slot() -> AppointmentSlot {
        let requested = DateTime::parse_from_rfc3339("2025-03-10T07:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        AppointmentSlot::for_request(requested)
    }

    #[test]
    fn test_reservation_wire_format() {
        let event = NewCalendarEvent::reservation(
            "Иван Петров",
            "терапевт",
            "болит горло",
            &slot(),
            true,
            moscow(),
            "Europe/Moscow",
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["summary"], "Прием: Иван Петров, терапевт");
        assert_eq!(json["description"], "Симптомы: болит горло");
        assert_eq!(json["start"]["dateTime"], "2025-03-10T13:00:00+03:00");
        assert_eq!(json["start"]["timeZone"], "Europe/Moscow");
        assert_eq!(json["end"]["dateTime"], "2025-03-10T13:30:00+03:00");
        assert_eq!(
            json["extendedProperties"]["private"]["requiresConfirmation"],
            "true"
        );
    }

    #[test]
    fn test_reservation_without_confirmation_omits_properties() {
        let event = NewCalendarEvent::reservation(
            "Анна",
            "стоматолог",
            "болит зуб",
            &slot(),
            false,
            moscow(),
            "Europe/Moscow",
        );
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("extendedProperties").is_none());
        assert!(!event.requires_confirmation());
    }

    #[test]
    fn test_parse_listed_event() {
        let json = r#"{
            "id": "evt1",
            "summary": "Прием: Иван Петров, терапевт",
            "start": {"dateTime": "2025-03-10T13:00:00+03:00", "timeZone": "Europe/Moscow"},
            "end": {"dateTime": "2025-03-10T13:30:00+03:00"},
            "extendedProperties": {"private": {"requiresConfirmation": "true"}}
        }"#;
        let event: CalendarEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.slot(), Some(slot()));
        assert!(event.requires_confirmation());
        assert!(event.is_reservation_for("Иван Петров"));
        assert!(event.is_reservation_for("иван петров"));
        assert!(!event.is_reservation_for("Иван Сидоров"));
        assert!(!event.is_reservation_for("Иван"));
        assert!(event.is_reservation_for("  Иван \t Петров "));
    }

    #[test]
    fn test_name_match_ignores_inner_whitespace() {
        let event = CalendarEvent {
            id: "evt3".to_string(),
            summary: "Прием:  Иван   Петров , терапевт".to_string(),
            description: String::new(),
            start: None,
            end: None,
            extended_properties: None,
        };
        assert!(event.is_reservation_for("Иван Петров"));
        assert!(event.is_reservation_for("Иван  Петров"));
        assert!(!event.is_reservation_for("ИванПетров"));
    }

    #[test]
    fn test_all_day_event_has_no_slot() {
        let json = r#"{"id": "evt2", "summary": "Holiday", "start": {"date": "2025-03-10"}}"#;
        let event: CalendarEvent = serde_json::from_str(json).unwrap();
        assert!(event.slot().is_none());
    }
}
