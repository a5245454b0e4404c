mod common;

use common::{ScriptedGateway, donation, rig};
use refund_engine::domain::money::Amount;
use refund_engine::domain::records::WithdrawalId;
use refund_engine::domain::refund::{BatchStatus, DetailStatus};
use refund_engine::error::RefundError;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_partial_batch_scenario() {
    // Donations of 100, 200 and 50 with the second refund failing:
    // details end [refunded, failed, refunded], aggregate partial.
    let donations = vec![
        donation(1, dec!(100)),
        donation(2, dec!(200)),
        donation(3, dec!(50)),
    ];
    let rig = rig(&donations, ScriptedGateway::new(&["pay_2"])).await;

    let batch = rig
        .controller
        .create_batch_for_withdrawal(&WithdrawalId::new("wd_1"))
        .await
        .unwrap();
    assert_eq!(batch.status, BatchStatus::Pending);

    let batch = rig.controller.process(&batch.id, false).await.unwrap();

    assert_eq!(batch.status, BatchStatus::Partial);
    assert!(batch.processed_at.is_some());
    let statuses: Vec<_> = batch.details.iter().map(|d| d.status).collect();
    assert_eq!(
        statuses,
        vec![
            DetailStatus::Refunded,
            DetailStatus::Failed,
            DetailStatus::Refunded
        ]
    );
    assert!(batch.details[1].error.is_some());
    assert!(batch.details[0].error.is_none() && batch.details[2].error.is_none());
    // Every detail carries a terminal timestamp.
    assert!(batch.details.iter().all(|d| d.processed_at.is_some()));
}

#[tokio::test]
async fn test_conservation_across_lifecycle() {
    let donations = vec![
        donation(1, dec!(12.34)),
        donation(2, dec!(0.01)),
        donation(3, dec!(999.99)),
    ];
    let expected = Amount::total(donations.iter().map(|d| &d.amount));
    let rig = rig(&donations, ScriptedGateway::new(&["pay_3"])).await;

    let batch = rig
        .controller
        .create_batch_for_withdrawal(&WithdrawalId::new("wd_1"))
        .await
        .unwrap();
    assert_eq!(batch.total_amount(), expected);

    let batch = rig.controller.process(&batch.id, false).await.unwrap();
    // Amounts never drift, whatever the outcome of the attempts.
    assert_eq!(batch.total_amount(), expected);
}

#[tokio::test]
async fn test_notifier_fires_only_for_refunded_details() {
    let donations = vec![donation(1, dec!(100)), donation(2, dec!(200))];
    let rig = rig(&donations, ScriptedGateway::new(&["pay_1"])).await;

    let batch = rig
        .controller
        .create_batch_for_withdrawal(&WithdrawalId::new("wd_1"))
        .await
        .unwrap();
    rig.controller.process(&batch.id, false).await.unwrap();

    let notices = rig.notifier.recorded().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].amount, Amount::new(dec!(200)).unwrap());
}

#[tokio::test]
async fn test_reprocessing_terminal_batch_changes_nothing() {
    let donations = vec![donation(1, dec!(100)), donation(2, dec!(200))];
    let rig = rig(&donations, ScriptedGateway::new(&["pay_2"])).await;

    let batch = rig
        .controller
        .create_batch_for_withdrawal(&WithdrawalId::new("wd_1"))
        .await
        .unwrap();
    let first = rig.controller.process(&batch.id, false).await.unwrap();
    assert_eq!(first.status, BatchStatus::Partial);

    let second = rig.controller.process(&batch.id, false).await.unwrap();
    assert_eq!(second, first);

    // The ledger record is also untouched.
    let stored = rig.controller.status(&batch.id).await.unwrap();
    assert_eq!(stored, first);
}

#[tokio::test]
async fn test_concurrent_process_single_claim() {
    let donations = vec![donation(1, dec!(100)), donation(2, dec!(200))];
    let gateway = ScriptedGateway::new(&[]).with_delay(Duration::from_millis(200));
    let rig = Arc::new(rig(&donations, gateway).await);

    let batch = rig
        .controller
        .create_batch_for_withdrawal(&WithdrawalId::new("wd_1"))
        .await
        .unwrap();

    let a = {
        let rig = rig.clone();
        let id = batch.id.clone();
        tokio::spawn(async move { rig.controller.process(&id, false).await })
    };
    let b = {
        let rig = rig.clone();
        let id = batch.id.clone();
        tokio::spawn(async move { rig.controller.process(&id, false).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let completed = results
        .iter()
        .filter(|r| matches!(r, Ok(b) if b.status == BatchStatus::Completed))
        .count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(RefundError::Conflict(_))))
        .count();
    assert_eq!(completed, 1, "exactly one worker completes the batch");
    assert_eq!(conflicts, 1, "the other worker is told the batch is claimed");
}

#[tokio::test]
async fn test_find_by_withdrawal_round_trip() {
    let donations = vec![donation(1, dec!(100))];
    let rig = rig(&donations, ScriptedGateway::new(&[])).await;

    assert!(
        rig.controller
            .find_by_withdrawal(&WithdrawalId::new("wd_1"))
            .await
            .unwrap()
            .is_none()
    );

    let batch = rig
        .controller
        .create_batch_for_withdrawal(&WithdrawalId::new("wd_1"))
        .await
        .unwrap();
    let found = rig
        .controller
        .find_by_withdrawal(&WithdrawalId::new("wd_1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, batch.id);
}
