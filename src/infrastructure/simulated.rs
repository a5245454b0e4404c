use crate::config::GatewayConfig;
use crate::domain::gateway::{
    AccountBalance, Contact, FundAccount, Order, Payment, Payout, PayoutRequest, RefundReceipt,
    RefundStatus,
};
use crate::domain::money::Amount;
use crate::domain::ports::PaymentGateway;
use crate::domain::signature;
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Deterministic stand-in for the live gateway.
///
/// Every money-moving call succeeds after the configured simulated delay
/// and returns a synthetic id from a process-local counter. Signature
/// verification runs the real HMAC check against the configured secret,
/// so the donation-confirmation flow behaves identically in both modes.
pub struct SimulatedGateway {
    config: GatewayConfig,
    counter: AtomicU64,
}

impl SimulatedGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            counter: AtomicU64::new(0),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{prefix}_sim_{n}")
    }

    async fn simulate_latency(&self) {
        tokio::time::sleep(self.config.simulated_delay).await;
    }

    fn minor_units(amount: Amount) -> i64 {
        // Saturates on amounts beyond any real donation.
        amount.minor_units().unwrap_or(i64::MAX)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn create_order(
        &self,
        amount: Amount,
        currency: &str,
        receipt: &str,
    ) -> GatewayResult<Order> {
        self.simulate_latency().await;
        let order_id = self.next_id("order");
        debug!(%order_id, "simulated order created");
        Ok(Order {
            order_id,
            amount,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        })
    }

    fn verify_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        supplied: &str,
    ) -> GatewayResult<bool> {
        if self.config.key_secret.is_empty() {
            return Err(GatewayError::MissingCredentials);
        }
        Ok(signature::verify_payment_signature(
            order_id,
            payment_id,
            &self.config.key_secret,
            supplied,
        ))
    }

    async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Amount,
        _reason: &str,
    ) -> GatewayResult<RefundReceipt> {
        self.simulate_latency().await;
        let refund_id = self.next_id("rfnd");
        debug!(%refund_id, %payment_id, "simulated refund processed");
        Ok(RefundReceipt {
            refund_id,
            payment_id: payment_id.to_string(),
            amount,
            status: RefundStatus::Processed,
        })
    }

    async fn create_payout(&self, request: PayoutRequest) -> GatewayResult<Payout> {
        // Both protocol steps are stubbed; the fund account still comes
        // first so the flow mirrors the live adapter.
        let fund_account = self
            .create_fund_account(
                &request.beneficiary_account,
                &request.beneficiary_ifsc,
                &request.beneficiary_name,
                request.contact_id.as_deref(),
            )
            .await?;

        self.simulate_latency().await;
        Ok(Payout {
            payout_id: self.next_id("pout"),
            fund_account_id: fund_account.fund_account_id,
            amount_minor: Self::minor_units(request.amount),
            currency: "INR".to_string(),
            mode: "IMPS".to_string(),
            purpose: request.purpose,
            status: "processing".to_string(),
        })
    }

    async fn create_fund_account(
        &self,
        _beneficiary_account: &str,
        _beneficiary_ifsc: &str,
        _beneficiary_name: &str,
        contact_id: Option<&str>,
    ) -> GatewayResult<FundAccount> {
        self.simulate_latency().await;
        Ok(FundAccount {
            fund_account_id: self.next_id("fa"),
            contact_id: contact_id.map(str::to_string),
        })
    }

    async fn create_contact(
        &self,
        name: &str,
        email: &str,
        phone: &str,
    ) -> GatewayResult<Contact> {
        self.simulate_latency().await;
        Ok(Contact {
            contact_id: self.next_id("cont"),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        })
    }

    async fn payment_details(&self, payment_id: &str) -> GatewayResult<Payment> {
        self.simulate_latency().await;
        Ok(Payment {
            payment_id: payment_id.to_string(),
            order_id: None,
            amount_minor: 0,
            currency: "INR".to_string(),
            status: "captured".to_string(),
        })
    }

    async fn payout_details(&self, payout_id: &str) -> GatewayResult<Payout> {
        self.simulate_latency().await;
        Ok(Payout {
            payout_id: payout_id.to_string(),
            fund_account_id: self.next_id("fa"),
            amount_minor: 0,
            currency: "INR".to_string(),
            mode: "IMPS".to_string(),
            purpose: "Withdrawal payout".to_string(),
            status: "processing".to_string(),
        })
    }

    async fn account_balance(&self) -> GatewayResult<AccountBalance> {
        self.simulate_latency().await;
        Ok(AccountBalance {
            balance_minor: 10_000_000,
            account_id: "acc_sim".to_string(),
        })
    }
}
