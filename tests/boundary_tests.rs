use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn payload(amount: &str) -> Command {
    let mut cmd = Command::new(cargo_bin!("salon-qr"));
    cmd.env_remove("SERVICE_CATALOG")
        .args(["--owner-name", "Salon", "--iban", "CZ3230300000003247217010"])
        .args(["payload", "--amount", amount]);
    cmd
}

#[test]
fn test_boundary_amount_values() {
    payload("1000000")
        .assert()
        .success()
        .stdout(predicate::str::contains("*AM:1000000*"));

    payload("0.01")
        .assert()
        .success()
        .stdout(predicate::str::contains("*AM:0,01*"));
}

#[test]
fn test_out_of_range_amounts_fail() {
    for amount in ["0", "-5", "1000000.01", "abc", ""] {
        payload(amount)
            .assert()
            .failure()
            .stdout(predicate::str::is_empty());
    }
}

#[test]
fn test_extreme_decimal_precision() {
    payload("1.005").assert().failure();

    // Trailing zeros do not count as decimals.
    payload("12.500")
        .assert()
        .success()
        .stdout(predicate::str::contains("*AM:12,50*"));
}

#[test]
fn test_message_length_limits() {
    let mut cmd = payload("500");
    cmd.args(["--message", "x"]);
    cmd.assert().failure();

    let mut cmd = payload("500");
    cmd.arg("--message").arg("y".repeat(51));
    cmd.assert().failure();

    let mut cmd = payload("500");
    cmd.arg("--message").arg("z".repeat(50));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(format!("MSG:{}", "Z".repeat(50))));
}
