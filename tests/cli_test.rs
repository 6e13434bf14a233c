use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_replay_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("paycode"));
    cmd.arg("replay").arg("tests/fixtures/replay.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "transaction,client,tenant,amount,currency,status,card",
        ))
        .stdout(predicate::str::contains(
            "t1,alice,coffee-shop,4.5,EUR,CONFIRMED,alice-visa",
        ))
        // bob may not confirm with alice's card, so the abort goes through
        .stdout(predicate::str::contains("t2,bob,coffee-shop,12,EUR,ABORTED,"))
        .stdout(predicate::str::contains("t3,alice,book-store,30,USD,CLOSED,"))
        .stderr(predicate::str::contains("Error processing operation"));

    Ok(())
}

#[test]
fn test_cli_classify() {
    let mut cmd = Command::new(cargo_bin!("paycode"));
    cmd.args([
        "classify",
        "4111111111111111",
        "30000000000000",
        "341111111111111",
        "12345678901234567",
        "4111abc",
        "1234567890",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("number,network"))
        .stdout(predicate::str::contains("4111111111111111,visa"))
        .stdout(predicate::str::contains("30000000000000,diners_club"))
        .stdout(predicate::str::contains("341111111111111,american_express"))
        .stdout(predicate::str::contains("12345678901234567,debit"))
        .stdout(predicate::str::contains("4111abc,invalid"))
        .stdout(predicate::str::contains("1234567890,invalid"));
}

#[test]
fn test_cli_credential_round_trip() {
    let output = Command::new(cargo_bin!("paycode"))
        .args(["credential", "issue", "alice"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let token = String::from_utf8(output.stdout).unwrap();
    assert!(token.starts_with("paycode://"));

    Command::new(cargo_bin!("paycode"))
        .args(["credential", "decode", token.trim()])
        .assert()
        .success()
        .stdout("alice\n");
}

#[test]
fn test_cli_rejects_foreign_credential() {
    let output = Command::new(cargo_bin!("paycode"))
        .args(["credential", "issue", "alice"])
        .env("PAYCODE__CREDENTIAL__KEY", "first-key")
        .output()
        .expect("Failed to execute command");
    let token = String::from_utf8(output.stdout).unwrap();

    Command::new(cargo_bin!("paycode"))
        .args(["credential", "decode", token.trim()])
        .env("PAYCODE__CREDENTIAL__KEY", "second-key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed credential"));
}

#[test]
fn test_cli_config_file_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("paycode.toml");
    std::fs::write(&config, "[credential]\nlifetime_minutes = 0\n").unwrap();

    Command::new(cargo_bin!("paycode"))
        .arg("--config")
        .arg(&config)
        .args(["credential", "issue", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lifetime"));
}
