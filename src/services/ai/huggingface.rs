use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{LlmProvider, TokenStream};

const MAX_NEW_TOKENS: u32 = 512;
const TEMPERATURE: f32 = 0.3;

pub struct HuggingFaceProvider {
    token: String,
    model_url: String,
    client: reqwest::Client,
}

impl HuggingFaceProvider {
    pub fn new(token: String, model_url: String) -> Self {
        Self {
            token,
            model_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for HuggingFaceProvider {
    async fn generate(&self, prompt: &str) -> anyhow::Result<TokenStream> {
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": MAX_NEW_TOKENS,
                "temperature": TEMPERATURE,
                "return_full_text": false,
            },
            "stream": true,
        });

        let mut resp = self
            .client
            .post(&self.model_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("failed to call Hugging Face inference API")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Hugging Face API error ({status}): {text}");
        }

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut lines = LineBuffer::default();
            loop {
                let chunk = match resp.chunk().await {
                    Ok(Some(chunk)) => chunk,
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx
                            .send(Err(anyhow::Error::new(e).context("Hugging Face stream interrupted")))
                            .await;
                        return;
                    }
                };
                if !forward(lines.push(&chunk), &tx).await {
                    return;
                }
            }
            // the last event may arrive without a trailing newline
            forward(lines.finish(), &tx).await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Splits a byte stream into lines, keeping a partial line until more data arrives.
#[derive(Default)]
struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    fn finish(self) -> Vec<String> {
        if self.buf.is_empty() {
            return vec![];
        }
        vec![String::from_utf8_lossy(&self.buf).into_owned()]
    }
}

/// Sends the tokens found in `lines`; returns false once the stream should stop.
async fn forward(lines: Vec<String>, tx: &mpsc::Sender<anyhow::Result<String>>) -> bool {
    for line in lines {
        match parse_stream_line(&line) {
            Ok(Some(token)) => {
                if tx.send(Ok(token)).await.is_err() {
                    // receiver dropped
                    return false;
                }
            }
            Ok(None) => {}
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return false;
            }
        }
    }
    true
}

/// Extracts the token text from one server-sent-events line.
fn parse_stream_line(line: &str) -> anyhow::Result<Option<String>> {
    let Some(data) = line.trim().strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let event: serde_json::Value =
        serde_json::from_str(data).context("failed to parse Hugging Face stream event")?;

    if let Some(err) = event["error"].as_str() {
        anyhow::bail!("Hugging Face stream error: {err}");
    }
    if event["token"]["special"].as_bool().unwrap_or(false) {
        return Ok(None);
    }

    Ok(event["token"]["text"].as_str().map(|s| s.to_string()))
}
