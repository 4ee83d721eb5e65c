use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_offline_session_reports_unsynced() {
    let mut cmd = Command::new(cargo_bin!("coupon-ledger"));
    cmd.arg("tests/fixtures/session.csv").arg("--offline");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("monetary,birthday,10000,active,1,false"))
        .stdout(predicate::str::contains("usage,massage,0,depleted,1,false"))
        .stdout(predicate::str::contains("streak,workout,200,active,2,false"));
}

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let csv = common::command_file(&["load, monetary, birthday, 100"]).unwrap();

    let mut cmd = Command::new(cargo_bin!("coupon-ledger"));
    cmd.arg(csv.path()).arg("--cache-db").arg("some_db");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING: Persistent storage requested, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."))
        .stdout(predicate::str::contains("monetary,birthday,100,active,0,true"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let csv = common::command_file(&["load, monetary, birthday, 100"]).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::new(cargo_bin!("coupon-ledger"));
    cmd.arg(csv.path())
        .arg("--cache-db")
        .arg(dir.path().join("cache"));

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not());
}
