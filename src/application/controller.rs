use crate::config::DEFAULT_CALL_TIMEOUT;
use crate::domain::gateway::RefundReceipt;
use crate::domain::money::Amount;
use crate::domain::ports::{
    DonationDirectoryBox, PaymentGatewayBox, RefundLedgerBox, RefundNotifierBox,
};
use crate::domain::records::{BatchId, CampaignId, Donation, DonationId, WithdrawalId,
    WithdrawalStatus};
use crate::domain::refund::{BatchStatus, DetailStatus, RefundBatch};
use crate::error::{GatewayError, RefundError, Result};
use chrono::Utc;
use std::time::Duration;
use tracing::{info, warn};

/// Orchestrates refund batches against the payment gateway.
///
/// Owns boxed ports for the gateway, the ledger, the donation directory
/// and the notification sink; which implementations back them is decided
/// at startup. Details are processed sequentially, each gateway call
/// bounded by `call_timeout`.
pub struct RefundController {
    gateway: PaymentGatewayBox,
    ledger: RefundLedgerBox,
    directory: DonationDirectoryBox,
    notifier: RefundNotifierBox,
    call_timeout: Duration,
}

impl RefundController {
    pub fn new(
        gateway: PaymentGatewayBox,
        ledger: RefundLedgerBox,
        directory: DonationDirectoryBox,
        notifier: RefundNotifierBox,
    ) -> Self {
        Self {
            gateway,
            ledger,
            directory,
            notifier,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Creates a pending batch covering the given donations.
    ///
    /// Setup failures (unknown campaign or withdrawal, empty donation
    /// set, existing batch for the withdrawal) are fatal and reported
    /// before any ledger write.
    pub async fn create_batch(
        &self,
        campaign_id: CampaignId,
        withdrawal_id: WithdrawalId,
        donations: &[Donation],
    ) -> Result<RefundBatch> {
        if !self.directory.campaign_exists(&campaign_id).await? {
            return Err(RefundError::NotFound(format!("campaign {campaign_id}")));
        }
        if self.directory.withdrawal(&withdrawal_id).await?.is_none() {
            return Err(RefundError::NotFound(format!("withdrawal {withdrawal_id}")));
        }
        if donations.is_empty() {
            return Err(RefundError::Validation(
                "no donations to refund".to_string(),
            ));
        }
        if let Some(existing) = self.ledger.find_by_withdrawal(&withdrawal_id).await? {
            return Err(RefundError::Conflict(format!(
                "refund batch {} already exists for withdrawal {withdrawal_id}",
                existing.id
            )));
        }

        let batch = RefundBatch::create(campaign_id, withdrawal_id, donations, Utc::now());
        self.ledger.insert(batch.clone()).await?;
        info!(batch = %batch.id, details = batch.details.len(), "refund batch created");
        Ok(batch)
    }

    /// Convenience entry point for the withdrawal-reversal trigger:
    /// loads the rejected withdrawal, gathers the campaign's completed
    /// donations and creates the batch from them.
    pub async fn create_batch_for_withdrawal(
        &self,
        withdrawal_id: &WithdrawalId,
    ) -> Result<RefundBatch> {
        let withdrawal = self
            .directory
            .withdrawal(withdrawal_id)
            .await?
            .ok_or_else(|| RefundError::NotFound(format!("withdrawal {withdrawal_id}")))?;

        if withdrawal.status != WithdrawalStatus::Rejected {
            return Err(RefundError::Validation(format!(
                "withdrawal {withdrawal_id} is not rejected"
            )));
        }

        let donations = self
            .directory
            .completed_donations(&withdrawal.campaign_id)
            .await?;
        self.create_batch(withdrawal.campaign_id, withdrawal.id, &donations)
            .await
    }

    /// Drives every pending detail of the batch to a terminal status and
    /// recomputes the aggregate.
    ///
    /// Re-entry is idempotent: details already terminal are left
    /// untouched unless `retry_failed` is set, in which case failed
    /// details are explicitly reset before the run. A completed batch, or
    /// one with nothing to attempt, is returned unchanged. A batch
    /// already being processed yields `Conflict`.
    pub async fn process(&self, batch_id: &BatchId, retry_failed: bool) -> Result<RefundBatch> {
        let current = self
            .ledger
            .get(batch_id)
            .await?
            .ok_or_else(|| RefundError::NotFound(format!("refund batch {batch_id}")))?;

        match current.status {
            BatchStatus::Completed => return Ok(current),
            BatchStatus::Processing => {
                return Err(RefundError::Conflict(format!(
                    "refund batch {batch_id} is already being processed"
                )));
            }
            _ => {}
        }

        let has_pending = current
            .details
            .iter()
            .any(|d| d.status == DetailStatus::Pending);
        let has_failed = current
            .details
            .iter()
            .any(|d| d.status == DetailStatus::Failed);
        if !has_pending && !(retry_failed && has_failed) {
            // Everything is terminal and no retry was requested.
            return Ok(current);
        }

        // Atomic claim; a concurrent process() on the same batch loses
        // here with a Conflict.
        let mut batch = self.ledger.begin_processing(batch_id).await?;

        if retry_failed {
            for detail in &mut batch.details {
                detail.reset_for_retry();
            }
            self.ledger.update(batch.clone()).await?;
        }

        info!(batch = %batch.id, pending = batch.pending_donation_ids().len(), "processing refund batch");

        for idx in 0..batch.details.len() {
            if batch.details[idx].status != DetailStatus::Pending {
                continue;
            }
            let donation_id = batch.details[idx].donation_id.clone();
            let amount = batch.details[idx].amount;

            match self.attempt_refund(&donation_id, amount).await {
                Ok(receipt) => {
                    batch.details[idx].mark_refunded(receipt.refund_id, Utc::now());
                    if let Err(e) = self.directory.mark_refunded(&donation_id).await {
                        warn!(donation = %donation_id, error = %e, "failed to mark donation refunded");
                    }
                    self.notifier
                        .refund_succeeded(&batch.details[idx].donor_id, &batch.campaign_id, amount)
                        .await;
                }
                Err(description) => {
                    warn!(donation = %donation_id, error = %description, "refund attempt failed");
                    batch.details[idx].mark_failed(description, Utc::now());
                }
            }

            // Persist after every detail; the aggregate stays Processing
            // until all attempted details are terminal.
            self.ledger.update(batch.clone()).await?;
        }

        batch.status = BatchStatus::derive(&batch.details);
        batch.processed_at = Some(Utc::now());
        self.ledger.update(batch.clone()).await?;
        info!(batch = %batch.id, status = %batch.status, "refund batch processed");
        Ok(batch)
    }

    /// Read-only batch fetch, no side effects.
    pub async fn status(&self, batch_id: &BatchId) -> Result<RefundBatch> {
        self.ledger
            .get(batch_id)
            .await?
            .ok_or_else(|| RefundError::NotFound(format!("refund batch {batch_id}")))
    }

    /// Ledger lookup by withdrawal, for reconciliation tooling.
    pub async fn find_by_withdrawal(
        &self,
        withdrawal_id: &WithdrawalId,
    ) -> Result<Option<RefundBatch>> {
        self.ledger.find_by_withdrawal(withdrawal_id).await
    }

    /// One refund attempt for one donation. Every failure cause is
    /// flattened into the error description recorded on the detail; the
    /// batch loop never sees an Err from this.
    async fn attempt_refund(
        &self,
        donation_id: &DonationId,
        amount: Amount,
    ) -> std::result::Result<RefundReceipt, String> {
        let donation = match self.directory.donation(donation_id).await {
            Ok(Some(donation)) => donation,
            Ok(None) => return Err(format!("donation {donation_id} not found")),
            Err(e) => return Err(e.to_string()),
        };
        let Some(payment_id) = donation.payment_id else {
            return Err(format!("no payment id recorded for donation {donation_id}"));
        };

        match tokio::time::timeout(
            self.call_timeout,
            self.gateway
                .refund_payment(&payment_id, amount, "Campaign refund"),
        )
        .await
        {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(e)) => Err(e.to_string()),
            // The refund may still land upstream; payment_details() is
            // the follow-up reconciliation read.
            Err(_) => Err(GatewayError::Timeout(self.call_timeout.as_secs()).to_string()),
        }
    }
}
