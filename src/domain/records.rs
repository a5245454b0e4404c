use super::money::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

opaque_id!(CampaignId);
opaque_id!(WithdrawalId);
opaque_id!(DonationId);
opaque_id!(DonorId);
opaque_id!(
    /// Identity of a refund batch. Derived 1:1 from the withdrawal it
    /// reverses, which makes the at-most-one-batch-per-withdrawal
    /// invariant structural.
    BatchId
);

impl BatchId {
    pub fn for_withdrawal(withdrawal_id: &WithdrawalId) -> Self {
        Self(format!("rbatch_{withdrawal_id}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// A completed payment from a donor to a campaign, as recorded by the
/// (out-of-scope) donation subsystem. The engine only reads these and
/// flips `payment_status` to `Refunded` after a successful refund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: DonationId,
    pub campaign_id: CampaignId,
    pub donor_id: DonorId,
    pub amount: Amount,
    /// Gateway payment id captured at donation time. Absent for legacy
    /// rows that never completed the gateway flow; those cannot be
    /// refunded.
    pub payment_id: Option<String>,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

/// A prior payout of collected funds to a campaign owner. Only rejected
/// withdrawals are eligible for batch refunds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub campaign_id: CampaignId,
    pub amount: Amount,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_id_derivation() {
        let wid = WithdrawalId::new("wd_42");
        assert_eq!(BatchId::for_withdrawal(&wid).as_str(), "rbatch_wd_42");
        // Same withdrawal, same batch id.
        assert_eq!(
            BatchId::for_withdrawal(&wid),
            BatchId::for_withdrawal(&WithdrawalId::new("wd_42"))
        );
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let id = DonationId::new("don_1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"don_1\"");
    }
}
