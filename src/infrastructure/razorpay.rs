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
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Live HTTP implementation of the gateway adapter.
///
/// All calls go over HTTPS with Basic auth (`key_id:key_secret`) and JSON
/// bodies against the gateway REST API. This is the single live
/// transport; there is no SDK fallback path and no capability probing.
pub struct RazorpayGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        if config.key_id.is_empty() || config.key_secret.is_empty() {
            return Err(GatewayError::MissingCredentials);
        }
        let client = reqwest::Client::builder()
            .timeout(config.call_timeout)
            .build()
            .map_err(|e| GatewayError::Generic(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> GatewayResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::decode(response).await
    }

    fn transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.config.call_timeout.as_secs())
        } else {
            GatewayError::Generic(e.to_string())
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Generic(format!("invalid gateway response: {e}")))
    }

    fn minor_units(amount: Amount) -> GatewayResult<i64> {
        amount
            .minor_units()
            .ok_or_else(|| GatewayError::InvalidRequest(format!("amount {amount} out of range")))
    }
}

/// Maps the gateway's structured error body onto the classified error
/// set. The machine-readable `reason`/`code` fields drive the mapping;
/// anything unrecognized lands in the `Generic` bucket.
fn classify_error(status: StatusCode, body: &str) -> GatewayError {
    let parsed: Option<wire::ApiError> = serde_json::from_str(body).ok();
    let (code, reason, description) = match &parsed {
        Some(e) => (
            e.error.code.as_deref(),
            e.error.reason.as_deref(),
            e.error
                .description
                .clone()
                .unwrap_or_else(|| status.to_string()),
        ),
        None => (None, None, format!("{status}: {body}")),
    };

    match reason {
        Some("insufficient_funds") | Some("insufficient_balance") => {
            return GatewayError::InsufficientBalance(description);
        }
        Some("payment_not_found") | Some("payout_not_found") | Some("fund_account_not_found") => {
            return GatewayError::ResourceNotFound(description);
        }
        _ => {}
    }

    if status == StatusCode::NOT_FOUND {
        return GatewayError::ResourceNotFound(description);
    }

    match code {
        Some("BAD_REQUEST_ERROR") => GatewayError::InvalidRequest(description),
        _ => GatewayError::Generic(description),
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount: Amount,
        currency: &str,
        receipt: &str,
    ) -> GatewayResult<Order> {
        let body = wire::OrderBody {
            amount: Self::minor_units(amount)?,
            currency,
            receipt,
            payment_capture: 1,
        };
        let response: wire::OrderResponse = self.post_json("/orders", &body).await?;
        debug!(order = %response.id, "order created");
        Ok(Order {
            order_id: response.id,
            amount,
            currency: response.currency,
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
        reason: &str,
    ) -> GatewayResult<RefundReceipt> {
        let body = wire::RefundBody {
            amount: Self::minor_units(amount)?,
            speed: "normal",
            notes: wire::RefundNotes { reason },
        };
        let response: wire::RefundResponse = self
            .post_json(&format!("/payments/{payment_id}/refund"), &body)
            .await?;
        debug!(refund = %response.id, payment = %payment_id, "refund created");
        Ok(RefundReceipt {
            refund_id: response.id,
            payment_id: payment_id.to_string(),
            amount,
            status: if response.status == "processed" {
                RefundStatus::Processed
            } else {
                RefundStatus::Pending
            },
        })
    }

    async fn create_payout(&self, request: PayoutRequest) -> GatewayResult<Payout> {
        // Step 1: the fund account. A failure here aborts the payout; no
        // payout may reference a fund account that was never created.
        let fund_account = self
            .create_fund_account(
                &request.beneficiary_account,
                &request.beneficiary_ifsc,
                &request.beneficiary_name,
                request.contact_id.as_deref(),
            )
            .await?;

        // Step 2: the payout itself. queue_if_low_balance keeps a
        // momentary balance shortfall from hard-failing the call.
        let body = wire::PayoutBody {
            fund_account_id: &fund_account.fund_account_id,
            amount: Self::minor_units(request.amount)?,
            currency: "INR",
            mode: "IMPS",
            purpose: &request.purpose,
            queue_if_low_balance: true,
        };
        let response: wire::PayoutResponse = match self.post_json("/payouts", &body).await {
            Ok(response) => response,
            Err(e) => {
                warn!(fund_account = %fund_account.fund_account_id, error = %e, "payout creation failed");
                return Err(e);
            }
        };
        Ok(Payout {
            payout_id: response.id,
            fund_account_id: response.fund_account_id,
            amount_minor: response.amount,
            currency: response.currency,
            mode: response.mode,
            purpose: response.purpose,
            status: response.status,
        })
    }

    async fn create_fund_account(
        &self,
        beneficiary_account: &str,
        beneficiary_ifsc: &str,
        beneficiary_name: &str,
        contact_id: Option<&str>,
    ) -> GatewayResult<FundAccount> {
        let body = wire::FundAccountBody {
            account_type: "bank_account",
            bank_account: wire::BankAccount {
                name: beneficiary_name,
                ifsc: beneficiary_ifsc,
                account_number: beneficiary_account,
            },
            contact_id,
        };
        let response: wire::FundAccountResponse = self.post_json("/fund_accounts", &body).await?;
        debug!(fund_account = %response.id, "fund account created");
        Ok(FundAccount {
            fund_account_id: response.id,
            contact_id: response.contact_id,
        })
    }

    async fn create_contact(
        &self,
        name: &str,
        email: &str,
        phone: &str,
    ) -> GatewayResult<Contact> {
        let body = wire::ContactBody {
            name,
            email,
            contact: phone,
            r#type: "employee",
        };
        let response: wire::ContactResponse = self.post_json("/contacts", &body).await?;
        Ok(Contact {
            contact_id: response.id,
            name: response.name,
            email: response.email,
            phone: response.contact,
        })
    }

    async fn payment_details(&self, payment_id: &str) -> GatewayResult<Payment> {
        let response: wire::PaymentResponse =
            self.get_json(&format!("/payments/{payment_id}")).await?;
        Ok(Payment {
            payment_id: response.id,
            order_id: response.order_id,
            amount_minor: response.amount,
            currency: response.currency,
            status: response.status,
        })
    }

    async fn payout_details(&self, payout_id: &str) -> GatewayResult<Payout> {
        let response: wire::PayoutResponse =
            self.get_json(&format!("/payouts/{payout_id}")).await?;
        Ok(Payout {
            payout_id: response.id,
            fund_account_id: response.fund_account_id,
            amount_minor: response.amount,
            currency: response.currency,
            mode: response.mode,
            purpose: response.purpose,
            status: response.status,
        })
    }

    async fn account_balance(&self) -> GatewayResult<AccountBalance> {
        let response: wire::BalanceResponse = self.get_json("/accounts/me").await?;
        Ok(AccountBalance {
            balance_minor: response.balance.unwrap_or(0),
            account_id: response.id,
        })
    }
}

/// Wire-level request/response bodies, kept private to this transport.
mod wire {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize)]
    pub struct OrderBody<'a> {
        pub amount: i64,
        pub currency: &'a str,
        pub receipt: &'a str,
        pub payment_capture: u8,
    }

    #[derive(Deserialize)]
    pub struct OrderResponse {
        pub id: String,
        pub currency: String,
    }

    #[derive(Serialize)]
    pub struct RefundBody<'a> {
        pub amount: i64,
        pub speed: &'a str,
        pub notes: RefundNotes<'a>,
    }

    #[derive(Serialize)]
    pub struct RefundNotes<'a> {
        pub reason: &'a str,
    }

    #[derive(Deserialize)]
    pub struct RefundResponse {
        pub id: String,
        pub status: String,
    }

    #[derive(Serialize)]
    pub struct FundAccountBody<'a> {
        pub account_type: &'a str,
        pub bank_account: BankAccount<'a>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub contact_id: Option<&'a str>,
    }

    #[derive(Serialize)]
    pub struct BankAccount<'a> {
        pub name: &'a str,
        pub ifsc: &'a str,
        pub account_number: &'a str,
    }

    #[derive(Deserialize)]
    pub struct FundAccountResponse {
        pub id: String,
        pub contact_id: Option<String>,
    }

    #[derive(Serialize)]
    pub struct PayoutBody<'a> {
        pub fund_account_id: &'a str,
        pub amount: i64,
        pub currency: &'a str,
        pub mode: &'a str,
        pub purpose: &'a str,
        pub queue_if_low_balance: bool,
    }

    #[derive(Deserialize)]
    pub struct PayoutResponse {
        pub id: String,
        pub fund_account_id: String,
        pub amount: i64,
        pub currency: String,
        pub mode: String,
        pub purpose: String,
        pub status: String,
    }

    #[derive(Serialize)]
    pub struct ContactBody<'a> {
        pub name: &'a str,
        pub email: &'a str,
        pub contact: &'a str,
        pub r#type: &'a str,
    }

    #[derive(Deserialize)]
    pub struct ContactResponse {
        pub id: String,
        pub name: String,
        pub email: String,
        pub contact: String,
    }

    #[derive(Deserialize)]
    pub struct PaymentResponse {
        pub id: String,
        pub order_id: Option<String>,
        pub amount: i64,
        pub currency: String,
        pub status: String,
    }

    #[derive(Deserialize)]
    pub struct BalanceResponse {
        pub id: String,
        pub balance: Option<i64>,
    }

    #[derive(Deserialize)]
    pub struct ApiError {
        pub error: ApiErrorBody,
    }

    #[derive(Deserialize)]
    pub struct ApiErrorBody {
        pub code: Option<String>,
        pub description: Option<String>,
        pub reason: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayMode;

    #[test]
    fn test_new_requires_credentials() {
        let config = GatewayConfig::new("", "", GatewayMode::Live);
        assert!(matches!(
            RazorpayGateway::new(config),
            Err(GatewayError::MissingCredentials)
        ));
    }

    #[test]
    fn test_classify_insufficient_balance_by_reason() {
        let body = r#"{"error":{"code":"BAD_REQUEST_ERROR","description":"Your account does not have enough balance","reason":"insufficient_funds"}}"#;
        let error = classify_error(StatusCode::BAD_REQUEST, body);
        assert!(matches!(error, GatewayError::InsufficientBalance(_)));
    }

    #[test]
    fn test_classify_not_found_by_status() {
        let body = r#"{"error":{"code":"BAD_REQUEST_ERROR","description":"The id provided does not exist","reason":null}}"#;
        let error = classify_error(StatusCode::NOT_FOUND, body);
        assert!(matches!(error, GatewayError::ResourceNotFound(_)));
    }

    #[test]
    fn test_classify_bad_request_by_code() {
        let body = r#"{"error":{"code":"BAD_REQUEST_ERROR","description":"The amount is invalid","reason":"amount_less_than_minimum"}}"#;
        let error = classify_error(StatusCode::BAD_REQUEST, body);
        assert!(matches!(error, GatewayError::InvalidRequest(_)));
    }

    #[test]
    fn test_classify_unparseable_body_is_generic() {
        let error = classify_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert!(matches!(error, GatewayError::Generic(_)));
    }

    #[test]
    fn test_fund_account_body_omits_missing_contact() {
        let body = wire::FundAccountBody {
            account_type: "bank_account",
            bank_account: wire::BankAccount {
                name: "Campaign Owner",
                ifsc: "HDFC0000001",
                account_number: "1234567890",
            },
            contact_id: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("contact_id").is_none());
        assert_eq!(json["bank_account"]["ifsc"], "HDFC0000001");
    }
}
