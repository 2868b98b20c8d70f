use crate::errors::BookingError;

pub const DEFAULT_SPECIALIST: &str = "терапевт";

/// Maps a symptom description to the specialist who should see the patient.
pub trait SpecialistRouter: Send + Sync {
    fn route(&self, symptoms: &str) -> Result<String, BookingError>;
}

const RULES: &[(&str, &[&str])] = &[
    ("стоматолог", &["зуб", "десн", "челюст"]),
    ("кардиолог", &["сердц", "давлени", "пульс", "аритми"]),
    ("невролог", &["головн", "мигрен", "головокруж", "онемени"]),
    ("оториноларинголог", &["в ухе", "уши", "ушах", "насморк", "пазух", "заложен"]),
    ("офтальмолог", &["глаз", "зрени"]),
    ("дерматолог", &["сыпь", "кож", "зуд", "прыщ"]),
    ("гастроэнтеролог", &["живот", "желуд", "изжог", "тошнот"]),
    ("травматолог", &["перелом", "ушиб", "вывих", "растяжен"]),
];

/// Keyword table over lowercase symptom stems; first match wins.
pub struct KeywordRouter {
    rules: &'static [(&'static str, &'static [&'static str])],
    fallback: &'static str,
}

impl Default for KeywordRouter {
    fn default() -> Self {
        Self {
            rules: RULES,
            fallback: DEFAULT_SPECIALIST,
        }
    }
}

impl SpecialistRouter for KeywordRouter {
    fn route(&self, symptoms: &str) -> Result<String, BookingError> {
        let text = symptoms.trim().to_lowercase();
        if text.is_empty() {
            return Err(BookingError::RoutingFailure("no symptoms given".to_string()));
        }

        let specialist = self
            .rules
            .iter()
            .find(|(_, stems)| stems.iter().any(|stem| text.contains(stem)))
            .map(|(specialist, _)| *specialist)
            .unwrap_or(self.fallback);

        Ok(specialist.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throat_and_fever_goes_to_therapist() {
        let router = KeywordRouter::default();
        assert_eq!(router.route("болит горло и температура").unwrap(), "терапевт");
    }

    #[test]
    fn test_keyword_match() {
        let router = KeywordRouter::default();
        assert_eq!(router.route("Болит ЗУБ").unwrap(), "стоматолог");
        assert_eq!(router.route("скачет давление").unwrap(), "кардиолог");
        assert_eq!(router.route("сильная головная боль").unwrap(), "невролог");
    }

    #[test]
    fn test_empty_symptoms_fail() {
        let router = KeywordRouter::default();
        let err = router.route("   ").unwrap_err();
        assert!(matches!(err, BookingError::RoutingFailure(_)));
    }
}
