//! SendCheck Connectors
//!
//! HTTP implementations of the collaborator traits:
//! - [`MailgunDeliverer`] for [`sendcheck_campaign::Deliver`]
//! - [`GoogleTranslator`] for [`sendcheck_campaign::Translate`]
//! - [`GeminiAnalyzer`] for [`sendcheck_policy::Analyze`]
//! - [`GuidelineFetcher`] for regulator guideline text
//!
//! All connectors are `Send + Sync` and meant to be shared behind `Arc`.

pub mod client;
pub mod gemini;
pub mod guidelines;
pub mod mailgun;
pub mod translate;

pub use client::{HttpConfig, DEFAULT_TIMEOUT_SECS};
pub use gemini::{GeminiAnalyzer, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use guidelines::GuidelineFetcher;
pub use mailgun::{MailgunConfig, MailgunDeliverer, DEFAULT_MAILGUN_BASE_URL};
pub use translate::{GoogleTranslator, DEFAULT_TRANSLATE_BASE_URL};
