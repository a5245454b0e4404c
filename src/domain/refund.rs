use super::money::Amount;
use super::records::{BatchId, CampaignId, Donation, DonationId, DonorId, WithdrawalId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailStatus {
    Pending,
    Refunded,
    Failed,
}

impl DetailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailStatus::Pending => "pending",
            DetailStatus::Refunded => "refunded",
            DetailStatus::Failed => "failed",
        }
    }
}

impl BatchStatus {
    /// Aggregate status as a pure function of the detail statuses.
    ///
    /// * `Pending`    — no detail has been attempted.
    /// * `Processing` — some details are terminal, some still pending.
    /// * `Completed`  — every detail refunded.
    /// * `Failed`     — every detail failed.
    /// * `Partial`    — mixed refunded/failed with none left pending.
    pub fn derive(details: &[RefundDetail]) -> BatchStatus {
        let total = details.len();
        let refunded = details
            .iter()
            .filter(|d| d.status == DetailStatus::Refunded)
            .count();
        let failed = details
            .iter()
            .filter(|d| d.status == DetailStatus::Failed)
            .count();

        if refunded + failed == 0 {
            BatchStatus::Pending
        } else if refunded + failed < total {
            BatchStatus::Processing
        } else if refunded == total {
            BatchStatus::Completed
        } else if failed == total {
            BatchStatus::Failed
        } else {
            BatchStatus::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
            BatchStatus::Partial => "partial",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome record for a single donation inside a refund batch.
///
/// Mutated exactly once per attempt; a terminal detail is only reset
/// through [`RefundDetail::reset_for_retry`], never accidentally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundDetail {
    pub donor_id: DonorId,
    pub donation_id: DonationId,
    pub amount: Amount,
    pub status: DetailStatus,
    /// Human-readable gateway error, present iff `status == Failed`.
    pub error: Option<String>,
    /// Gateway refund id for a successful attempt.
    pub refund_id: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl RefundDetail {
    pub fn for_donation(donation: &Donation) -> Self {
        Self {
            donor_id: donation.donor_id.clone(),
            donation_id: donation.id.clone(),
            amount: donation.amount,
            status: DetailStatus::Pending,
            error: None,
            refund_id: None,
            processed_at: None,
        }
    }

    pub fn mark_refunded(&mut self, refund_id: String, at: DateTime<Utc>) {
        self.status = DetailStatus::Refunded;
        self.refund_id = Some(refund_id);
        self.error = None;
        self.processed_at = Some(at);
    }

    pub fn mark_failed(&mut self, error: String, at: DateTime<Utc>) {
        self.status = DetailStatus::Failed;
        self.error = Some(error);
        self.processed_at = Some(at);
    }

    /// Intentional regression of a failed attempt back to pending, used
    /// only when a caller asks for failed details to be retried.
    pub fn reset_for_retry(&mut self) {
        if self.status == DetailStatus::Failed {
            self.status = DetailStatus::Pending;
            self.error = None;
            self.processed_at = None;
        }
    }
}

/// Aggregate root for one withdrawal reversal. Immutable audit record:
/// created once, mutated only by the controller, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundBatch {
    pub id: BatchId,
    pub campaign_id: CampaignId,
    pub withdrawal_id: WithdrawalId,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub details: Vec<RefundDetail>,
}

impl RefundBatch {
    /// Builds a pending batch covering the given donation set, one
    /// pending detail per donation with the amount copied over.
    pub fn create(
        campaign_id: CampaignId,
        withdrawal_id: WithdrawalId,
        donations: &[Donation],
        created_at: DateTime<Utc>,
    ) -> Self {
        let details = donations.iter().map(RefundDetail::for_donation).collect();
        Self {
            id: BatchId::for_withdrawal(&withdrawal_id),
            campaign_id,
            withdrawal_id,
            status: BatchStatus::Pending,
            created_at,
            processed_at: None,
            details,
        }
    }

    /// Sum of the per-detail amounts; equals the covered donations' total
    /// for any batch built through [`RefundBatch::create`].
    pub fn total_amount(&self) -> rust_decimal::Decimal {
        Amount::total(self.details.iter().map(|d| &d.amount))
    }

    pub fn pending_donation_ids(&self) -> Vec<DonationId> {
        self.details
            .iter()
            .filter(|d| d.status == DetailStatus::Pending)
            .map(|d| d.donation_id.clone())
            .collect()
    }
}
