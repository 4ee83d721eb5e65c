use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("coupon-ledger"));
    cmd.arg("tests/fixtures/session.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "kind,coupon,balance,status,entries,synced",
        ))
        .stdout(predicate::str::contains("monetary,birthday,10000,active,1,true"))
        .stdout(predicate::str::contains("usage,massage,0,depleted,1,true"))
        .stdout(predicate::str::contains("streak,workout,200,active,2,true"))
        .stderr(predicate::str::contains(
            "Error processing command: insufficient balance: requested 20000, available 10000",
        ));

    Ok(())
}

#[test]
fn test_cli_history_table() {
    let file = common::command_file(&[
        "load, monetary, birthday, 15000",
        "redeem, monetary, birthday, 5000",
        "reset, monetary, birthday, 15000",
        "redeem, monetary, birthday, 100",
    ])
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("coupon-ledger"));
    cmd.arg(file.path()).arg("--history");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("monetary,birthday,14900,active,1,true"))
        .stdout(predicate::str::contains(
            "kind,coupon,action,amount,resulting_balance,date,time",
        ))
        .stdout(predicate::str::contains("monetary,birthday,redemption,100,14900,"))
        .stdout(predicate::str::contains("redemption,5000,10000").not());
}

#[test]
fn test_cli_invalid_rows_are_reported() {
    let file = common::command_file(&[
        "load, monetary, birthday, 100",
        "redeem, monetary, birthday, 1.5",
        "redeem, monetary, birthday, -4",
        "refund, monetary, birthday, 1",
        "workout, usage, birthday,",
        "redeem, monetary, birthday, 40",
    ])
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("coupon-ledger"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error processing command: invalid amount"))
        .stderr(predicate::str::contains("Error reading command"))
        .stderr(predicate::str::contains(
            "record_workout is not supported for usage coupons",
        ))
        .stdout(predicate::str::contains("monetary,birthday,60,active,1,true"));
}

#[test]
fn test_cli_custom_reward() {
    let file = common::command_file(&["workout, streak, gym,", "workout, streak, gym, 5"]).unwrap();

    let mut cmd = Command::new(cargo_bin!("coupon-ledger"));
    cmd.arg(file.path()).arg("--reward-per-workout").arg("30");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("streak,gym,35,active,2,true"));
}
