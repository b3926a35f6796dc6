//! SendCheck Campaign
//!
//! Compliance-gated bulk sending.
//!
//! This crate provides:
//! - Collaborator contracts for delivery and translation
//! - The campaign runner, which refuses failing verdicts and attempts every
//!   recipient exactly once
//! - The end-to-end pipeline from template to send tally

pub mod collaborator;
pub mod pipeline;
pub mod runner;
pub mod translation;

pub use collaborator::{Deliver, RecordedMessage, RecordingDeliverer, Translate};
pub use pipeline::{CampaignOutcome, CampaignRequest, ComplianceCheck, Pipeline};
pub use runner::CampaignRunner;
pub use translation::{translate_or_passthrough, Language, PreparedTemplate};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::collaborator::{Deliver, Translate};
    pub use crate::pipeline::{CampaignOutcome, CampaignRequest, Pipeline};
    pub use crate::runner::CampaignRunner;
    pub use crate::translation::Language;
}
