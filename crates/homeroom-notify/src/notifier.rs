//! Fire-time delivery fan-out.

use std::time::Duration;

use tracing::{info, warn};

use homeroom_core::config::DEFAULT_SEND_TIMEOUT_SECS;
use homeroom_core::localtime;
use homeroom_core::reminder::OffsetLabel;
use homeroom_core::types::AssignmentId;
use homeroom_store::Store;

use crate::error::Result;
use crate::format;
use crate::sender::TextSender;

/// What a delivery attempt actually did — for logs and tests. Nothing in
/// here is retried or escalated.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Members a send was attempted for.
    pub attempted: Vec<String>,
    /// Members without an address, plus members whose send failed or timed out.
    pub unreachable: Vec<String>,
    /// Whether the owner's summary went through.
    pub owner_notified: bool,
}

/// Resolves recipients for a fired reminder and delivers to each of them.
pub struct Notifier<S: TextSender> {
    store: Store,
    sender: S,
    per_recipient_timeout: Duration,
}

impl<S: TextSender> Notifier<S> {
    pub fn new(store: Store, sender: S) -> Self {
        Self::with_timeout(store, sender, Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS))
    }

    /// `per_recipient_timeout` bounds every individual send so one hanging
    /// transport call cannot block the remaining recipients.
    pub fn with_timeout(store: Store, sender: S, per_recipient_timeout: Duration) -> Self {
        Self {
            store,
            sender,
            per_recipient_timeout,
        }
    }

    /// Deliver one fired reminder.
    ///
    /// The assignment and group are re-fetched fresh here — a job armed
    /// days ago must not trust any snapshot. Either row missing means the
    /// reminder's subject is gone: logged, empty report, no error.
    pub async fn deliver(&self, assignment_id: AssignmentId, label: OffsetLabel) -> Result<DeliveryReport> {
        let Some(assignment) = self.store.assignment(assignment_id)? else {
            info!(%assignment_id, %label, "assignment gone at fire time — nothing to deliver");
            return Ok(DeliveryReport::default());
        };
        let Some(group) = self.store.group(assignment.group_id)? else {
            info!(
                %assignment_id,
                group_id = %assignment.group_id,
                "group gone at fire time — nothing to deliver"
            );
            return Ok(DeliveryReport::default());
        };

        // The zone was validated when the group was created; a bad value
        // here means the database was edited out-of-band.
        let tz = match localtime::parse_zone(&group.timezone) {
            Ok(tz) => tz,
            Err(_) => {
                warn!(group_id = %group.id, timezone = %group.timezone, "stored timezone is invalid — skipping delivery");
                return Ok(DeliveryReport::default());
            }
        };

        let body = format::reminder_body(label, &group, &assignment, tz);
        let roster = self.store.roster(group.id)?;

        let mut report = DeliveryReport::default();
        for recipient in &roster {
            match recipient.address.as_deref() {
                None => {
                    // No chat bound yet — still audited in the summary.
                    report.unreachable.push(recipient.name.clone());
                }
                Some(address) => {
                    report.attempted.push(recipient.name.clone());
                    if !self.try_send(address, &body, &recipient.name).await {
                        report.unreachable.push(recipient.name.clone());
                    }
                }
            }
        }

        // The owner always gets the summary, even when also enrolled. Owner
        // delivery failure is the last step and goes nowhere but the log.
        let summary = format::owner_summary(&body, &report.unreachable);
        report.owner_notified = self
            .try_send(&group.owner_address, &summary, "owner")
            .await;

        info!(
            %assignment_id,
            %label,
            attempted = report.attempted.len(),
            unreachable = report.unreachable.len(),
            owner_notified = report.owner_notified,
            "reminder delivery finished"
        );
        Ok(report)
    }

    /// One bounded send attempt. Failures are logged and reported as
    /// `false`; they never propagate.
    async fn try_send(&self, address: &str, text: &str, who: &str) -> bool {
        match tokio::time::timeout(self.per_recipient_timeout, self.sender.send_text(address, text))
            .await
        {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(recipient = %who, error = %e, "reminder delivery failed");
                false
            }
            Err(_) => {
                warn!(
                    recipient = %who,
                    timeout_secs = self.per_recipient_timeout.as_secs(),
                    "reminder delivery timed out"
                );
                false
            }
        }
    }
}
