use async_trait::async_trait;
use chrono::Utc;
use refund_engine::application::controller::RefundController;
use refund_engine::domain::gateway::{
    AccountBalance, Contact, FundAccount, Order, Payment, Payout, PayoutRequest, RefundReceipt,
    RefundStatus,
};
use refund_engine::domain::money::Amount;
use refund_engine::domain::ports::PaymentGateway;
use refund_engine::domain::records::{
    CampaignId, Donation, DonationId, DonorId, PaymentStatus, Withdrawal, WithdrawalId,
    WithdrawalStatus,
};
use refund_engine::error::{GatewayError, GatewayResult};
use refund_engine::infrastructure::in_memory::{InMemoryDonationDirectory, InMemoryLedger};
use refund_engine::infrastructure::notify::RecordingNotifier;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Gateway double for integration tests: refunds succeed after an
/// optional delay except for the scripted payment ids.
pub struct ScriptedGateway {
    failing_payments: HashSet<String>,
    delay: Duration,
    counter: AtomicU64,
}

impl ScriptedGateway {
    pub fn new(failing: &[&str]) -> Self {
        Self {
            failing_payments: failing.iter().map(|s| s.to_string()).collect(),
            delay: Duration::ZERO,
            counter: AtomicU64::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_order(
        &self,
        amount: Amount,
        currency: &str,
        receipt: &str,
    ) -> GatewayResult<Order> {
        Ok(Order {
            order_id: "order_scripted".to_string(),
            amount,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        })
    }

    fn verify_payment(&self, _: &str, _: &str, _: &str) -> GatewayResult<bool> {
        Ok(true)
    }

    async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Amount,
        _reason: &str,
    ) -> GatewayResult<RefundReceipt> {
        tokio::time::sleep(self.delay).await;
        if self.failing_payments.contains(payment_id) {
            return Err(GatewayError::InvalidRequest(format!(
                "payment {payment_id} cannot be refunded"
            )));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(RefundReceipt {
            refund_id: format!("rfnd_{n}"),
            payment_id: payment_id.to_string(),
            amount,
            status: RefundStatus::Processed,
        })
    }

    async fn create_payout(&self, _: PayoutRequest) -> GatewayResult<Payout> {
        unreachable!("not exercised by these tests")
    }

    async fn create_fund_account(
        &self,
        _: &str,
        _: &str,
        _: &str,
        _: Option<&str>,
    ) -> GatewayResult<FundAccount> {
        unreachable!("not exercised by these tests")
    }

    async fn create_contact(&self, _: &str, _: &str, _: &str) -> GatewayResult<Contact> {
        unreachable!("not exercised by these tests")
    }

    async fn payment_details(&self, _: &str) -> GatewayResult<Payment> {
        unreachable!("not exercised by these tests")
    }

    async fn payout_details(&self, _: &str) -> GatewayResult<Payout> {
        unreachable!("not exercised by these tests")
    }

    async fn account_balance(&self) -> GatewayResult<AccountBalance> {
        unreachable!("not exercised by these tests")
    }
}

pub fn donation(n: u32, amount: Decimal) -> Donation {
    Donation {
        id: DonationId::new(format!("don_{n}")),
        campaign_id: CampaignId::new("camp_1"),
        donor_id: DonorId::new(format!("donor_{n}")),
        amount: Amount::new(amount).unwrap(),
        payment_id: Some(format!("pay_{n}")),
        payment_status: PaymentStatus::Completed,
    }
}

/// Directory seeded with a rejected withdrawal `wd_1` over `camp_1` and
/// the given donations.
pub async fn seeded_directory(donations: &[Donation]) -> InMemoryDonationDirectory {
    let directory = InMemoryDonationDirectory::new();
    let total: Decimal = donations.iter().map(|d| d.amount.value()).sum();
    directory
        .seed_withdrawal(Withdrawal {
            id: WithdrawalId::new("wd_1"),
            campaign_id: CampaignId::new("camp_1"),
            amount: Amount::new(total.max(Decimal::ONE)).unwrap(),
            status: WithdrawalStatus::Rejected,
            created_at: Utc::now(),
        })
        .await;
    for donation in donations {
        directory.seed_donation(donation.clone()).await;
    }
    directory
}

pub struct TestRig {
    pub controller: RefundController,
    pub notifier: RecordingNotifier,
}

pub async fn rig(donations: &[Donation], gateway: ScriptedGateway) -> TestRig {
    let notifier = RecordingNotifier::new();
    let controller = RefundController::new(
        Box::new(gateway),
        Box::new(InMemoryLedger::new()),
        Box::new(seeded_directory(donations).await),
        Box::new(notifier.clone()),
    );
    TestRig {
        controller,
        notifier,
    }
}

/// Writes a donations CSV the CLI can consume.
pub fn write_donations_csv(path: &Path, rows: &[(&str, &str, &str, &str)]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "donation, donor, amount, payment_id")?;
    for (donation, donor, amount, payment_id) in rows {
        writeln!(file, "{donation}, {donor}, {amount}, {payment_id}")?;
    }
    Ok(())
}
