use crate::domain::money::Amount;
use crate::domain::ports::RefundNotifier;
use crate::domain::records::{CampaignId, DonorId};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Notification sink that emits a structured log line per refunded
/// donation. The real notification subsystem is out of scope; this is
/// the trigger it would hang off.
#[derive(Default, Clone, Copy)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RefundNotifier for LogNotifier {
    async fn refund_succeeded(&self, donor_id: &DonorId, campaign_id: &CampaignId, amount: Amount) {
        info!(donor = %donor_id, campaign = %campaign_id, %amount, "donation refunded");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefundNotice {
    pub donor_id: DonorId,
    pub campaign_id: CampaignId,
    pub amount: Amount,
}

/// Records every notification for assertions. Cloning shares the
/// underlying buffer.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<RefundNotice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded(&self) -> Vec<RefundNotice> {
        self.notices.lock().await.clone()
    }
}

#[async_trait]
impl RefundNotifier for RecordingNotifier {
    async fn refund_succeeded(&self, donor_id: &DonorId, campaign_id: &CampaignId, amount: Amount) {
        self.notices.lock().await.push(RefundNotice {
            donor_id: donor_id.clone(),
            campaign_id: campaign_id.clone(),
            amount,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_recording_notifier_shares_buffer() {
        let notifier = RecordingNotifier::new();
        let clone = notifier.clone();

        clone
            .refund_succeeded(
                &DonorId::new("donor_1"),
                &CampaignId::new("camp_1"),
                Amount::new(dec!(10)).unwrap(),
            )
            .await;

        let recorded = notifier.recorded().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].donor_id, DonorId::new("donor_1"));
    }
}
