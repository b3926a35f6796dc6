//! Collaborator contracts for delivery and translation

use async_trait::async_trait;
use parking_lot::Mutex;
use sendcheck_core::Result;

/// Sends one message to one address
///
/// `Ok(true)` means the provider accepted the message, `Ok(false)` that it
/// refused it. `Err` is a transport-level failure. The runner counts both
/// of the latter as a single-recipient failure.
#[async_trait]
pub trait Deliver: Send + Sync {
    /// Deliver `body` to `to`
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<bool>;

    /// Collaborator name
    fn name(&self) -> &str;
}

/// Translates text into a target language
#[async_trait]
pub trait Translate: Send + Sync {
    /// Translate `text` into `target_language` (an ISO 639-1 code)
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;

    /// Collaborator name
    fn name(&self) -> &str;
}

/// A message captured by [`RecordingDeliverer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMessage {
    /// Destination address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Personalized body
    pub body: String,
}

/// Deliverer that records messages instead of sending them (dry runs)
#[derive(Debug, Default)]
pub struct RecordingDeliverer {
    messages: Mutex<Vec<RecordedMessage>>,
}

impl RecordingDeliverer {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, in delivery order
    pub fn messages(&self) -> Vec<RecordedMessage> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl Deliver for RecordingDeliverer {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<bool> {
        self.messages.lock().push(RecordedMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(true)
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
