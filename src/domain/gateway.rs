//! Value objects exchanged with the payment gateway. Shapes follow the
//! gateway's REST responses so both adapter implementations return the
//! same types.

use super::money::Amount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub amount: Amount,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Processed,
    Pending,
}

/// Result of a refund call against the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub refund_id: String,
    pub payment_id: String,
    pub amount: Amount,
    pub status: RefundStatus,
}

/// Read-through view of a payment, used for reconciliation after an
/// abandoned client-side wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: String,
    pub order_id: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
}

/// Input for the two-step payout protocol: fund account first, payout
/// against it second.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutRequest {
    pub amount: Amount,
    pub beneficiary_account: String,
    pub beneficiary_ifsc: String,
    pub beneficiary_name: String,
    pub purpose: String,
    /// Optional gateway contact the fund account is grouped under. Payout
    /// creation never provisions contacts itself.
    pub contact_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub payout_id: String,
    pub fund_account_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub mode: String,
    pub purpose: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundAccount {
    pub fund_account_id: String,
    pub contact_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub contact_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub balance_minor: i64,
    pub account_id: String,
}
