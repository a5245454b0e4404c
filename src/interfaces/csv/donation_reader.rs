use crate::domain::money::Amount;
use crate::domain::records::{CampaignId, Donation, DonationId, DonorId, PaymentStatus};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct DonationRow {
    donation: String,
    donor: String,
    amount: Decimal,
    #[serde(default)]
    payment_id: Option<String>,
}

/// Reads donation records from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<Donation>`. It handles whitespace trimming and flexible record
/// lengths automatically; the campaign the rows belong to is supplied by
/// the caller since the export format does not carry it.
pub struct DonationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> DonationReader<R> {
    /// Creates a new `DonationReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and converts donation rows.
    ///
    /// Rows that fail to parse or carry a non-positive amount yield an
    /// error item without stopping the stream.
    pub fn donations(self, campaign_id: CampaignId) -> impl Iterator<Item = Result<Donation>> {
        self.reader.into_deserialize().map(move |row| {
            let row: DonationRow = row?;
            let payment_id = row.payment_id.filter(|p| !p.is_empty());
            Ok(Donation {
                id: DonationId::new(row.donation),
                campaign_id: campaign_id.clone(),
                donor_id: DonorId::new(row.donor),
                amount: Amount::new(row.amount)?,
                payment_id,
                payment_status: PaymentStatus::Completed,
            })
        })
    }
}
