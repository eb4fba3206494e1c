//! Smoke tests for the `rescue` binary against the demo chain.

use std::path::PathBuf;
use std::process::Command;

fn demo_chain() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/rescue-chain.json")
}

fn account(seed: u8) -> String {
    format!("0x{}", format!("{seed:02x}").repeat(32))
}

fn rescue(args: &[&str]) -> std::process::Output {
    let config_dir = tempfile::tempdir().unwrap();
    Command::new(env!("CARGO_BIN_EXE_rescue"))
        .args(args)
        .arg("--config")
        .arg(config_dir.path().join("config.toml"))
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn rescuer_json_reports_withdraw_phase() {
    let chain = demo_chain();
    let output = rescue(&[
        "rescuer",
        "--chain",
        chain.to_str().unwrap(),
        "--lost",
        &account(1),
        "--rescuer",
        &account(2),
        "--json",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["phase"], "withdraw");
    assert_eq!(view["amounts"]["span_count"], 3);
}

#[test]
fn friend_status_is_printed() {
    let chain = demo_chain();
    let output = rescue(&[
        "friend",
        "--chain",
        chain.to_str().unwrap(),
        "--lost",
        &account(1),
        "--friend",
        &account(102),
        "--rescuer",
        &account(2),
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("recovery.vouch_recovery"), "{stdout}");
}

#[test]
fn owner_of_configured_account_is_offered_removal() {
    let chain = demo_chain();
    let output = rescue(&[
        "owner",
        "--chain",
        chain.to_str().unwrap(),
        "--account",
        &account(1),
        "--json",
    ]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["can_remove"], true);
    assert_eq!(report["call"], serde_json::json!({"call": "remove_recovery"}));
}

#[test]
fn missing_chain_file_fails() {
    let output = rescue(&[
        "rescuer",
        "--chain",
        "/nonexistent/chain.json",
        "--lost",
        &account(1),
        "--rescuer",
        &account(2),
    ]);
    assert!(!output.status.success());
}
