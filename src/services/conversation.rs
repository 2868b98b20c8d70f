use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tokio_stream::{Stream, StreamExt};

use crate::errors::BookingError;
use crate::models::calendar_event::normalize_name;
use crate::models::{AppointmentRequest, ConversationState, IntakeStep};
use crate::services::ai::{format_prompt, LlmProvider, TokenStream};
use crate::services::booking::BookingOrchestrator;

pub const DETAILS_PROMPT: &str =
    "Пожалуйста, укажите ваше полное имя и опишите симптомы (через запятую).";
pub const FORMAT_ERROR: &str =
    "Неверный формат. Пожалуйста, укажите имя и симптомы через запятую.";
pub const GENERATION_ERROR: &str = "Произошла внутренняя ошибка. Пожалуйста, повторите запрос.";

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Cumulative reply text; every item extends the previous one.
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

pub enum Reply {
    Text(String),
    Stream(TextStream),
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Reply::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

pub struct ConversationTracker {
    sessions: Mutex<HashMap<String, ConversationState>>,
    orchestrator: BookingOrchestrator,
    llm: Box<dyn LlmProvider>,
    triggers: Vec<String>,
    system_prompt: String,
    ttl: Duration,
    clock: Clock,
}

impl ConversationTracker {
    pub fn new(
        orchestrator: BookingOrchestrator,
        llm: Box<dyn LlmProvider>,
        triggers: Vec<String>,
        system_prompt: String,
        ttl: Duration,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            orchestrator,
            llm,
            triggers: triggers.into_iter().map(|t| t.to_lowercase()).collect(),
            system_prompt,
            ttl,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn handle(
        &self,
        session_id: &str,
        message: &str,
        history: &[(String, String)],
    ) -> Reply {
        let now = (self.clock)();
        let step = self.begin_turn(session_id, now);

        tracing::info!(session = session_id, step = step.as_str(), "processing message");

        match step {
            IntakeStep::Idle if self.is_trigger(message) => {
                self.set_step(session_id, IntakeStep::AwaitingDetails);
                Reply::Text(DETAILS_PROMPT.to_string())
            }
            IntakeStep::Idle => self.generate(message, history).await,
            IntakeStep::AwaitingDetails => match parse_details(message) {
                // Stay in AwaitingDetails so the next message is parsed again.
                Err(e) => {
                    tracing::info!(session = session_id, error = %e, "intake parse failed");
                    Reply::Text(FORMAT_ERROR.to_string())
                }
                Ok((name, symptoms)) => {
                    let request = AppointmentRequest {
                        name,
                        symptoms,
                        requested_at: now,
                    };
                    let outcome = self.orchestrator.book(&request).await;
                    self.set_step(session_id, IntakeStep::Idle);

                    tracing::info!(
                        session = session_id,
                        outcome = outcome.as_str(),
                        event_id = outcome.event_id().unwrap_or("-"),
                        "booking attempt finished"
                    );
                    Reply::Text(self.orchestrator.render(&outcome))
                }
            },
        }
    }

    /// Current step for a live session; `None` once evicted or never seen.
    pub fn step(&self, session_id: &str) -> Option<IntakeStep> {
        let now = (self.clock)();
        self.sessions()
            .get(session_id)
            .filter(|s| !s.is_expired(now))
            .map(|s| s.step)
    }

    pub fn active_sessions(&self) -> usize {
        let now = (self.clock)();
        self.sessions().values().filter(|s| !s.is_expired(now)).count()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, ConversationState>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Evicts abandoned sessions, then loads or creates this one and refreshes its TTL.
    fn begin_turn(&self, session_id: &str, now: DateTime<Utc>) -> IntakeStep {
        let mut sessions = self.sessions();
        sessions.retain(|id, s| {
            if !s.is_expired(now) {
                return true;
            }
            tracing::debug!(
                session = %id,
                step = s.step.as_str(),
                idle_minutes = s.idle_for(now).num_minutes(),
                "expired session evicted"
            );
            false
        });

        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationState::new(session_id, now, self.ttl));
        state.touch(now, self.ttl);
        state.step
    }

    fn set_step(&self, session_id: &str, step: IntakeStep) {
        if let Some(state) = self.sessions().get_mut(session_id) {
            state.step = step;
        }
    }

    fn is_trigger(&self, message: &str) -> bool {
        let text = message.to_lowercase();
        self.triggers.iter().any(|t| text.contains(t.as_str()))
    }

    async fn generate(&self, message: &str, history: &[(String, String)]) -> Reply {
        let prompt = format_prompt(&self.system_prompt, history, message);
        match self.llm.generate(&prompt).await {
            Ok(tokens) => Reply::Stream(accumulate(tokens)),
            Err(e) => {
                tracing::error!(error = %e, "text generation failed");
                Reply::Text(GENERATION_ERROR.to_string())
            }
        }
    }
}

/// Turns a token stream into a growing-prefix stream. A mid-stream failure
/// ends the stream with the generic error text.
fn accumulate(tokens: TokenStream) -> TextStream {
    let mut text = String::new();
    let mut failed = false;
    Box::pin(tokens.map_while(move |item| {
        if failed {
            return None;
        }
        match item {
            Ok(token) => {
                text.push_str(&token);
                Some(text.clone())
            }
            Err(e) => {
                tracing::error!(error = %e, "text generation interrupted");
                failed = true;
                Some(GENERATION_ERROR.to_string())
            }
        }
    }))
}

/// Splits `"<name>, <symptoms>"` on the first comma.
pub fn parse_details(message: &str) -> Result<(String, String), BookingError> {
    let (name, symptoms) = message
        .split_once(',')
        .ok_or_else(|| BookingError::ParseFailure("no comma between name and symptoms".to_string()))?;

    let name = normalize_name(name);
    let symptoms = symptoms.trim();
    if name.is_empty() || symptoms.is_empty() {
        return Err(BookingError::ParseFailure(
            "name and symptoms must both be present".to_string(),
        ));
    }

    Ok((name, symptoms.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_details() {
        let (name, symptoms) = parse_details("Иван Петров, болит горло и температура").unwrap();
        assert_eq!(name, "Иван Петров");
        assert_eq!(symptoms, "болит горло и температура");
    }

    #[test]
    fn test_parse_details_splits_on_first_comma() {
        let (name, symptoms) = parse_details("Анна, кашель, насморк").unwrap();
        assert_eq!(name, "Анна");
        assert_eq!(symptoms, "кашель, насморк");
    }

    #[test]
    fn test_parse_details_collapses_name_whitespace() {
        let (name, _) = parse_details(" Иван   Петров , кашель").unwrap();
        assert_eq!(name, "Иван Петров");
    }

    #[test]
    fn test_parse_details_rejects_malformed() {
        assert!(matches!(
            parse_details("Иван Петров болит горло"),
            Err(BookingError::ParseFailure(_))
        ));
        assert!(parse_details(", болит горло").is_err());
        assert!(parse_details("Иван,   ").is_err());
    }

    #[tokio::test]
    async fn test_accumulate_grows_prefixes() {
        let tokens: TokenStream = Box::pin(tokio_stream::iter(vec![
            Ok("Здрав".to_string()),
            Ok("ствуйте".to_string()),
            Ok("!".to_string()),
        ]));
        let items: Vec<String> = accumulate(tokens).collect().await;
        assert_eq!(items, vec!["Здрав", "Здравствуйте", "Здравствуйте!"]);
    }

    #[tokio::test]
    async fn test_accumulate_stops_on_error() {
        let tokens: TokenStream = Box::pin(tokio_stream::iter(vec![
            Ok("Здрав".to_string()),
            Err(anyhow::anyhow!("reset by peer")),
            Ok("never".to_string()),
        ]));
        let items: Vec<String> = accumulate(tokens).collect().await;
        assert_eq!(items, vec!["Здрав".to_string(), GENERATION_ERROR.to_string()]);
    }
}
