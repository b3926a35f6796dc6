//! Campaign runner
//!
//! Dispatches one personalized message per recipient through a [`Deliver`]
//! collaborator and tallies the outcome. The compliance precondition is
//! checked here, not by callers: a failing verdict aborts before the first
//! delivery attempt.
//!
//! Every recipient is attempted exactly once per [`CampaignRunner::send`]
//! call. A refused or failed delivery counts as a failure for that recipient
//! only and never stops the batch. There is no retry.

use futures::stream::{self, StreamExt};
use sendcheck_core::{personalize, ComplianceVerdict, Error, Recipient, Result, SendResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::collaborator::Deliver;

/// Sends a compliance-approved template to a recipient list
pub struct CampaignRunner {
    deliverer: Arc<dyn Deliver>,
    concurrency: usize,
}

impl CampaignRunner {
    /// Create a runner that delivers sequentially, in recipient order
    pub fn new(deliverer: Arc<dyn Deliver>) -> Self {
        Self {
            deliverer,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` deliveries in flight
    ///
    /// With more than one in flight, delivery order is no longer preserved;
    /// the final counts are.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Configured number of in-flight deliveries
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Send `template` to every recipient
    ///
    /// Fails with [`Error::ComplianceBlocked`] without contacting the
    /// deliverer if `verdict` did not pass.
    pub async fn send(
        &self,
        recipients: &[Recipient],
        template: &str,
        subject: &str,
        verdict: &ComplianceVerdict,
    ) -> Result<SendResult> {
        if !verdict.passed() {
            warn!(
                violations = verdict.violations().len(),
                "Refusing to send: template failed compliance"
            );
            return Err(Error::ComplianceBlocked {
                violations: verdict.violations().len(),
            });
        }

        info!(
            recipients = recipients.len(),
            deliverer = %self.deliverer.name(),
            concurrency = self.concurrency,
            "Starting campaign send"
        );

        let result = if self.concurrency == 1 {
            let mut result = SendResult::default();
            for recipient in recipients {
                if self.attempt(recipient, template, subject).await {
                    result.record_success();
                } else {
                    result.record_failure();
                }
            }
            result
        } else {
            // attempts complete out of order; only this fold writes the tally
            stream::iter(recipients)
                .map(|recipient| self.attempt(recipient, template, subject))
                .buffer_unordered(self.concurrency)
                .fold(SendResult::default(), |mut result, delivered| async move {
                    if delivered {
                        result.record_success();
                    } else {
                        result.record_failure();
                    }
                    result
                })
                .await
        };

        info!(
            sent = result.success_count,
            failed = result.failure_count,
            "Campaign send finished"
        );
        Ok(result)
    }

    /// One delivery attempt; true when the collaborator accepted the message
    async fn attempt(&self, recipient: &Recipient, template: &str, subject: &str) -> bool {
        let body = personalize(template, &recipient.first_name);
        match self.deliverer.deliver(&recipient.email, subject, &body).await {
            Ok(true) => {
                debug!(to = %recipient.email, "Delivered");
                true
            }
            Ok(false) => {
                warn!(to = %recipient.email, "Delivery refused");
                false
            }
            Err(e) => {
                warn!(to = %recipient.email, error = %e, "Delivery failed");
                false
            }
        }
    }
}
