//! Text-completion client — integration with the external completion service
//!
//! Defines the client trait and error types for requesting structured
//! analysis documents. Two implementations:
//! - `SubprocessCompletion`: pipes the prompt to a configured command's stdin
//!   and reads the completion from stdout (production)
//! - `MockCompletion`: returns preconfigured responses (testing)
//!
//! No format guarantee is assumed on what comes back; the response validator
//! is the contract enforcer, not the completion service.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::Mutex;

/// Errors from completion client operations.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion service not available: {0}")]
    Unavailable(String),
    #[error("completion request failed: {0}")]
    RequestFailed(String),
    #[error("completion returned empty output")]
    EmptyResponse,
}

/// Client trait for the text-completion capability.
///
/// Abstracts over transport (subprocess, mock) so the assisted analyzer
/// doesn't depend on how the service is reached.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Check if the completion service is reachable.
    async fn is_available(&self) -> bool;

    /// Send a prompt and return the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Completion client that shells out to an external command.
///
/// The prompt goes to the child's stdin; stdout is the completion. The
/// command is expected to be a thin bridge to whatever completion service is
/// deployed — its transport is not this crate's concern.
pub struct SubprocessCompletion {
    program: String,
    args: Vec<String>,
}

impl SubprocessCompletion {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

#[async_trait]
impl CompletionClient for SubprocessCompletion {
    async fn is_available(&self) -> bool {
        // The bridge command must at least exist and be spawnable.
        tokio::process::Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok()
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        use tokio::io::AsyncWriteExt;

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CompletionError::Unavailable(format!("{}: {}", self.program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CompletionError::RequestFailed("no stdin handle".to_string()))?;
        stdin
            .write_all(prompt.as_bytes())
            .await
            .map_err(|e| CompletionError::RequestFailed(e.to_string()))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CompletionError::RequestFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(CompletionError::RequestFailed(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Mock client for testing — returns preconfigured responses in order.
pub struct MockCompletion {
    available: bool,
    responses: Mutex<VecDeque<Result<String, CompletionError>>>,
}

impl MockCompletion {
    /// Create a mock client that reports as available.
    pub fn available() -> Self {
        Self {
            available: true,
            responses: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a mock client that reports as unavailable.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            responses: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a successful response.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(response.into()));
        self
    }

    /// Queue a failure.
    pub fn with_failure(self, error: CompletionError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        if !self.available {
            return Err(CompletionError::Unavailable(
                "mock client configured as unavailable".to_string(),
            ));
        }
        match self.responses.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Err(CompletionError::RequestFailed(
                "no mock response queued".to_string(),
            )),
        }
    }
}

/// A completion client that never responds within any deadline.
///
/// Test helper for exercising timeout handling.
pub struct HangingCompletion;

#[async_trait]
impl CompletionClient for HangingCompletion {
    async fn is_available(&self) -> bool {
        true
    }

    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}
