use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    Idle,
    AwaitingDetails,
}

impl IntakeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeStep::Idle => "idle",
            IntakeStep::AwaitingDetails => "awaiting_details",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    pub step: IntakeStep,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(session_id: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            session_id: session_id.to_string(),
            step: IntakeStep::Idle,
            last_activity: now,
            expires_at: now + ttl,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.last_activity = now;
        self.expires_at = now + ttl;
    }

    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_activity
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_touch_refreshes_activity_and_expiry() {
        let ttl = Duration::minutes(30);
        let mut state = ConversationState::new("s1", at("2025-03-10T07:00:00Z"), ttl);
        assert_eq!(state.idle_for(at("2025-03-10T07:20:00Z")), Duration::minutes(20));

        state.touch(at("2025-03-10T07:20:00Z"), ttl);
        assert_eq!(state.idle_for(at("2025-03-10T07:45:00Z")), Duration::minutes(25));
        assert!(!state.is_expired(at("2025-03-10T07:45:00Z")));
        assert!(state.is_expired(at("2025-03-10T07:50:00Z")));
    }
}
