use std::env;

use anyhow::Context;
use chrono::{Duration, FixedOffset};

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Вы — система записи к врачу. Строго следуйте инструкциям.";

const MAX_SESSION_TTL_MINUTES: i64 = 7 * 24 * 60;

const DEFAULT_HF_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.3";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub calendar_id: String,
    pub calendar_creds: String,
    pub calendar_timezone: String,
    pub calendar_utc_offset_hours: i32,
    pub confirmation_webhook_url: Option<String>,
    pub require_confirmation: bool,
    pub hf_token: String,
    pub hf_model_url: String,
    pub session_ttl_minutes: i64,
    pub booking_triggers: Vec<String>,
    pub system_prompt: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7860),
            calendar_id: required("GOOGLE_CALENDAR_ID")?,
            calendar_creds: required("GOOGLE_CREDS")?,
            calendar_timezone: env::var("CALENDAR_TIMEZONE")
                .unwrap_or_else(|_| "Europe/Moscow".to_string()),
            calendar_utc_offset_hours: env::var("CALENDAR_UTC_OFFSET_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            confirmation_webhook_url: env::var("CONFIRMATION_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            require_confirmation: env::var("REQUIRE_CONFIRMATION")
                .map(|v| parse_bool(&v))
                .unwrap_or(true),
            hf_token: required("HF_TOKEN")?,
            hf_model_url: env::var("HF_MODEL_URL")
                .unwrap_or_else(|_| DEFAULT_HF_MODEL_URL.to_string()),
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            booking_triggers: env::var("BOOKING_TRIGGERS")
                .map(|v| parse_triggers(&v))
                .unwrap_or_else(|_| default_triggers()),
            system_prompt: env::var("SYSTEM_PROMPT")
                .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string()),
        };

        config.session_ttl()?;
        config.calendar_offset()?;
        Ok(config)
    }

    pub fn session_ttl(&self) -> anyhow::Result<Duration> {
        session_ttl(self.session_ttl_minutes)
    }

    pub fn calendar_offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.calendar_utc_offset_hours * 3600)
            .context("CALENDAR_UTC_OFFSET_HOURS out of range")
    }

    /// Confirmation is only requested when a webhook URL is configured.
    pub fn confirmation_enabled(&self) -> bool {
        self.require_confirmation && self.confirmation_webhook_url.is_some()
    }
}

pub fn default_triggers() -> Vec<String> {
    vec![
        "запис".to_string(),
        "симптом".to_string(),
        "appointment".to_string(),
    ]
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{name} must be set"))
}

fn session_ttl(minutes: i64) -> anyhow::Result<Duration> {
    anyhow::ensure!(
        (1..=MAX_SESSION_TTL_MINUTES).contains(&minutes),
        "SESSION_TTL_MINUTES must be between 1 and {MAX_SESSION_TTL_MINUTES}, got {minutes}"
    );
    Duration::try_minutes(minutes).context("SESSION_TTL_MINUTES out of range")
}

fn parse_bool(v: &str) -> bool {
    matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_triggers(v: &str) -> Vec<String> {
    let triggers: Vec<String> = v
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if triggers.is_empty() {
        default_triggers()
    } else {
        triggers
    }
}
