use std::path::Path;
use std::process::{Command, Output};

use forceadmin_core::address::Address;
use serde_json::Value;

pub fn addr(seed: u8) -> String {
    Address::from_bytes("terra", &[seed; 20]).unwrap().to_string()
}

pub fn forceadmin_bin(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_forceadmin"));
    cmd.current_dir(dir);
    cmd
}

pub fn run(dir: &Path, args: &[&str]) -> Output {
    forceadmin_bin(dir)
        .args(args)
        .output()
        .expect("failed to run forceadmin")
}

/// Run forceadmin, assert exit code, return parsed JSON stdout.
pub fn forceadmin_json(dir: &Path, args: &[&str], expected_exit: i32) -> Value {
    let out = run(dir, args);
    let code = out.status.code().unwrap_or(-1);
    assert_eq!(
        code,
        expected_exit,
        "exit mismatch for: forceadmin {}\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).unwrap_or_else(|e| {
        panic!(
            "invalid JSON from: forceadmin {}\n{e}\nstdout: {}",
            args.join(" "),
            String::from_utf8_lossy(&out.stdout)
        )
    })
}

/// Run forceadmin, return stdout as string (exit 0 expected).
#[allow(dead_code)]
pub fn forceadmin_stdout(dir: &Path, args: &[&str]) -> String {
    let out = run(dir, args);
    assert!(
        out.status.success(),
        "forceadmin {} failed with exit {}\nstderr: {}",
        args.join(" "),
        out.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).to_string()
}

/// Init `gov.json` with authority `addr(0xA1)` and contract `addr(0xC1)`
/// administered by `addr(0xB1)`.
#[allow(dead_code)]
pub fn init_module(dir: &Path) {
    let contracts = serde_json::json!([{ "contract": addr(0xC1), "admin": addr(0xB1) }]);
    std::fs::write(dir.join("contracts.json"), contracts.to_string()).unwrap();
    let gov = addr(0xA1);
    forceadmin_stdout(
        dir,
        &["init", "gov.json", "--authority", &gov, "--contracts", "contracts.json"],
    );
}
