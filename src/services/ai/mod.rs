pub mod huggingface;

use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;

/// Generated text, one token per item.
pub type TokenStream = Pin<Box<dyn Stream<Item = anyhow::Result<String>> + Send>>;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<TokenStream>;
}

pub fn format_prompt(system_prompt: &str, history: &[(String, String)], message: &str) -> String {
    let mut prompt = format!("{system_prompt}\n\n");
    for (user, assistant) in history {
        prompt.push_str(&format!("Пользователь: {user}\nПомощник: {assistant}\n"));
    }
    prompt.push_str(&format!("Пользователь: {message}\nПомощник: "));
    prompt
}
