use super::gateway::{
    AccountBalance, Contact, FundAccount, Order, Payment, Payout, PayoutRequest, RefundReceipt,
};
use super::money::Amount;
use super::records::{BatchId, CampaignId, Donation, DonationId, DonorId, WithdrawalId, Withdrawal};
use super::refund::RefundBatch;
use crate::error::{GatewayResult, Result};
use async_trait::async_trait;

/// The sole point of contact with the external payment gateway.
///
/// Implemented once per transport: `RazorpayGateway` for live traffic,
/// `SimulatedGateway` for deterministic testing. The implementation is
/// chosen at startup from configuration; business logic never branches on
/// the mode.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount: Amount,
        currency: &str,
        receipt: &str,
    ) -> GatewayResult<Order>;

    /// Recomputes the payment signature and compares it to the supplied
    /// one. A mismatch is `Ok(false)`; only a missing secret is an error.
    fn verify_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> GatewayResult<bool>;

    async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Amount,
        reason: &str,
    ) -> GatewayResult<RefundReceipt>;

    async fn create_payout(&self, request: PayoutRequest) -> GatewayResult<Payout>;

    async fn create_fund_account(
        &self,
        beneficiary_account: &str,
        beneficiary_ifsc: &str,
        beneficiary_name: &str,
        contact_id: Option<&str>,
    ) -> GatewayResult<FundAccount>;

    async fn create_contact(&self, name: &str, email: &str, phone: &str)
    -> GatewayResult<Contact>;

    async fn payment_details(&self, payment_id: &str) -> GatewayResult<Payment>;

    async fn payout_details(&self, payout_id: &str) -> GatewayResult<Payout>;

    /// Diagnostic read, not part of the refund hot path.
    async fn account_balance(&self) -> GatewayResult<AccountBalance>;
}

/// Persisted record of refund batches and their per-donation outcomes.
/// The only mutable shared resource in the engine; every mutation is
/// atomic at the granularity of one batch write.
#[async_trait]
pub trait RefundLedger: Send + Sync {
    /// Inserts a new batch. Fails with `Conflict` if a batch already
    /// exists for the same withdrawal.
    async fn insert(&self, batch: RefundBatch) -> Result<()>;

    async fn get(&self, batch_id: &BatchId) -> Result<Option<RefundBatch>>;

    async fn find_by_withdrawal(&self, withdrawal_id: &WithdrawalId)
    -> Result<Option<RefundBatch>>;

    /// Atomically claims a batch for processing: transitions
    /// pending/partial/failed to processing and returns the claimed
    /// record. A batch already processing yields `Conflict`, so two
    /// workers can never double-attempt the same detail.
    async fn begin_processing(&self, batch_id: &BatchId) -> Result<RefundBatch>;

    /// Writes back the full batch record.
    async fn update(&self, batch: RefundBatch) -> Result<()>;
}

/// Read side of the donation/campaign/withdrawal store owned by the
/// out-of-scope CRUD subsystem, plus the one write-back the refund flow
/// needs.
#[async_trait]
pub trait DonationDirectory: Send + Sync {
    async fn campaign_exists(&self, campaign_id: &CampaignId) -> Result<bool>;

    async fn withdrawal(&self, withdrawal_id: &WithdrawalId) -> Result<Option<Withdrawal>>;

    async fn donation(&self, donation_id: &DonationId) -> Result<Option<Donation>>;

    /// All completed donations tied to a campaign, in insertion order.
    async fn completed_donations(&self, campaign_id: &CampaignId) -> Result<Vec<Donation>>;

    /// Flips the donation's payment status after a successful refund.
    async fn mark_refunded(&self, donation_id: &DonationId) -> Result<()>;
}

/// Notification sink triggered when a donor's refund goes through. The
/// notification subsystem itself is out of scope; failures here must not
/// affect batch outcomes.
#[async_trait]
pub trait RefundNotifier: Send + Sync {
    async fn refund_succeeded(
        &self,
        donor_id: &DonorId,
        campaign_id: &CampaignId,
        amount: Amount,
    );
}

pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type RefundLedgerBox = Box<dyn RefundLedger>;
pub type DonationDirectoryBox = Box<dyn DonationDirectory>;
pub type RefundNotifierBox = Box<dyn RefundNotifier>;
