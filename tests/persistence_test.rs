#![cfg(feature = "storage-rocksdb")]

mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::NamedTempFile;

#[test]
fn test_batch_survives_process_restart() {
    let csv = NamedTempFile::new().unwrap();
    common::write_donations_csv(
        csv.path(),
        &[
            ("don_1", "donor_1", "100.0", "pay_1"),
            ("don_2", "donor_2", "200.0", "pay_2"),
        ],
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("refunds_db");

    let run = |path: &std::path::Path| {
        let mut cmd = Command::new(cargo_bin!("refund-engine"));
        cmd.arg(csv.path())
            .arg("--campaign")
            .arg("camp_1")
            .arg("--withdrawal")
            .arg("wd_1")
            .arg("--db-path")
            .arg(path);
        cmd
    };

    // First run processes the batch to completion.
    run(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("don_1,donor_1,100.0,refunded,"))
        .stdout(predicate::str::contains("don_2,donor_2,200.0,refunded,"));

    // Second run finds the persisted batch and reprocessing it is a
    // no-op with the same terminal outcome.
    run(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("don_1,donor_1,100.0,refunded,"))
        .stdout(predicate::str::contains("don_2,donor_2,200.0,refunded,"));
}
