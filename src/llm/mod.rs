//! Language-model adapter abstraction.
//!
//! The engine only sees the [`ChatModel`] trait: "given a prompt, return a
//! free-form textual answer". The shipped backend talks to a local Ollama
//! server; others can be swapped in by the orchestrator.

pub mod ollama;

pub use ollama::OllamaClient;

/// Async adapter implemented by each language-model backend.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    /// Send a prompt, return the raw completion text. Transport and API
    /// failures surface as errors; the timeout budget is applied by the
    /// caller, not here.
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}
