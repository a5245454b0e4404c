use crate::domain::refund::RefundBatch;
use crate::error::Result;
use std::io::Write;

/// Writes the per-donation outcome of a refund batch as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(destination: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(destination),
        }
    }

    pub fn write_batch(&mut self, batch: &RefundBatch) -> Result<()> {
        self.writer
            .write_record(["donation", "donor", "amount", "status", "error"])?;
        for detail in &batch.details {
            self.writer.write_record([
                detail.donation_id.as_str(),
                detail.donor_id.as_str(),
                &detail.amount.to_string(),
                detail.status.as_str(),
                detail.error.as_deref().unwrap_or(""),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Amount;
    use crate::domain::records::{CampaignId, Donation, DonationId, DonorId, PaymentStatus,
        WithdrawalId};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_batch_rows() {
        let donations = vec![
            Donation {
                id: DonationId::new("don_1"),
                campaign_id: CampaignId::new("camp_1"),
                donor_id: DonorId::new("donor_1"),
                amount: Amount::new(dec!(100)).unwrap(),
                payment_id: Some("pay_1".to_string()),
                payment_status: PaymentStatus::Completed,
            },
            Donation {
                id: DonationId::new("don_2"),
                campaign_id: CampaignId::new("camp_1"),
                donor_id: DonorId::new("donor_2"),
                amount: Amount::new(dec!(200)).unwrap(),
                payment_id: Some("pay_2".to_string()),
                payment_status: PaymentStatus::Completed,
            },
        ];
        let mut batch = RefundBatch::create(
            CampaignId::new("camp_1"),
            WithdrawalId::new("wd_1"),
            &donations,
            Utc::now(),
        );
        batch.details[0].mark_refunded("rfnd_1".to_string(), Utc::now());
        batch.details[1].mark_failed("payment pay_2 cannot be refunded".to_string(), Utc::now());

        let mut output = Vec::new();
        ReportWriter::new(&mut output).write_batch(&batch).unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.starts_with("donation,donor,amount,status,error\n"));
        assert!(text.contains("don_1,donor_1,100,refunded,\n"));
        assert!(text.contains("don_2,donor_2,200,failed,payment pay_2 cannot be refunded\n"));
    }
}
