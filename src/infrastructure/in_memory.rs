use crate::domain::ports::{DonationDirectory, RefundLedger};
use crate::domain::records::{BatchId, CampaignId, Donation, DonationId, PaymentStatus,
    Withdrawal, WithdrawalId};
use crate::domain::refund::{BatchStatus, RefundBatch};
use crate::error::{RefundError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory refund ledger.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access; the write
/// lock makes every batch mutation, including the `begin_processing`
/// claim, atomic. Ideal for tests and one-shot CLI runs.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    batches: Arc<RwLock<HashMap<BatchId, RefundBatch>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefundLedger for InMemoryLedger {
    async fn insert(&self, batch: RefundBatch) -> Result<()> {
        let mut batches = self.batches.write().await;
        let duplicate = batches.contains_key(&batch.id)
            || batches
                .values()
                .any(|b| b.withdrawal_id == batch.withdrawal_id);
        if duplicate {
            return Err(RefundError::Conflict(format!(
                "refund batch already exists for withdrawal {}",
                batch.withdrawal_id
            )));
        }
        batches.insert(batch.id.clone(), batch);
        Ok(())
    }

    async fn get(&self, batch_id: &BatchId) -> Result<Option<RefundBatch>> {
        let batches = self.batches.read().await;
        Ok(batches.get(batch_id).cloned())
    }

    async fn find_by_withdrawal(
        &self,
        withdrawal_id: &WithdrawalId,
    ) -> Result<Option<RefundBatch>> {
        let batches = self.batches.read().await;
        Ok(batches
            .values()
            .find(|b| &b.withdrawal_id == withdrawal_id)
            .cloned())
    }

    async fn begin_processing(&self, batch_id: &BatchId) -> Result<RefundBatch> {
        let mut batches = self.batches.write().await;
        let batch = batches
            .get_mut(batch_id)
            .ok_or_else(|| RefundError::NotFound(format!("refund batch {batch_id}")))?;

        match batch.status {
            BatchStatus::Processing => Err(RefundError::Conflict(format!(
                "refund batch {batch_id} is already being processed"
            ))),
            BatchStatus::Completed => Err(RefundError::Conflict(format!(
                "refund batch {batch_id} is already completed"
            ))),
            BatchStatus::Pending | BatchStatus::Partial | BatchStatus::Failed => {
                batch.status = BatchStatus::Processing;
                Ok(batch.clone())
            }
        }
    }

    async fn update(&self, batch: RefundBatch) -> Result<()> {
        let mut batches = self.batches.write().await;
        if !batches.contains_key(&batch.id) {
            return Err(RefundError::NotFound(format!("refund batch {}", batch.id)));
        }
        batches.insert(batch.id.clone(), batch);
        Ok(())
    }
}

/// In-memory view of the donation/campaign/withdrawal records owned by
/// the out-of-scope CRUD subsystem. Seeded by tests and the CLI.
#[derive(Default, Clone)]
pub struct InMemoryDonationDirectory {
    campaigns: Arc<RwLock<HashSet<CampaignId>>>,
    withdrawals: Arc<RwLock<HashMap<WithdrawalId, Withdrawal>>>,
    // Vec keeps donation order stable for batch creation.
    donations: Arc<RwLock<Vec<Donation>>>,
}

impl InMemoryDonationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_campaign(&self, campaign_id: CampaignId) {
        self.campaigns.write().await.insert(campaign_id);
    }

    /// Registers a withdrawal (and implicitly its campaign).
    pub async fn seed_withdrawal(&self, withdrawal: Withdrawal) {
        self.campaigns
            .write()
            .await
            .insert(withdrawal.campaign_id.clone());
        self.withdrawals
            .write()
            .await
            .insert(withdrawal.id.clone(), withdrawal);
    }

    /// Registers a donation (and implicitly its campaign).
    pub async fn seed_donation(&self, donation: Donation) {
        self.campaigns
            .write()
            .await
            .insert(donation.campaign_id.clone());
        self.donations.write().await.push(donation);
    }
}

#[async_trait]
impl DonationDirectory for InMemoryDonationDirectory {
    async fn campaign_exists(&self, campaign_id: &CampaignId) -> Result<bool> {
        Ok(self.campaigns.read().await.contains(campaign_id))
    }

    async fn withdrawal(&self, withdrawal_id: &WithdrawalId) -> Result<Option<Withdrawal>> {
        Ok(self.withdrawals.read().await.get(withdrawal_id).cloned())
    }

    async fn donation(&self, donation_id: &DonationId) -> Result<Option<Donation>> {
        let donations = self.donations.read().await;
        Ok(donations.iter().find(|d| &d.id == donation_id).cloned())
    }

    async fn completed_donations(&self, campaign_id: &CampaignId) -> Result<Vec<Donation>> {
        let donations = self.donations.read().await;
        Ok(donations
            .iter()
            .filter(|d| {
                &d.campaign_id == campaign_id && d.payment_status == PaymentStatus::Completed
            })
            .cloned()
            .collect())
    }

    async fn mark_refunded(&self, donation_id: &DonationId) -> Result<()> {
        let mut donations = self.donations.write().await;
        let donation = donations
            .iter_mut()
            .find(|d| &d.id == donation_id)
            .ok_or_else(|| RefundError::NotFound(format!("donation {donation_id}")))?;
        donation.payment_status = PaymentStatus::Refunded;
        Ok(())
    }
}
