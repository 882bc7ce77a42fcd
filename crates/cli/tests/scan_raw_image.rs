use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

/// Raw image for the reference scenario: code at 0x1000, `"hello"` stored
/// null-terminated at 0x2070, one contiguous file mapped at 0x1000.
fn write_scenario_image(dir: &std::path::Path) -> PathBuf {
    let words: [u32; 8] = [
        0x5800_00C8, // 0x1000: LDR X8, 0x1018 (pool holds 0x2050)
        0xD503_201F, // 0x1004: NOP
        0xD100_8101, // 0x1008: SUB X1, X8, #0x20
        0xB241_0101, // 0x100C: ORR X1, X8, #0x8000000000000000
        0xD65F_03C0, // 0x1010: RET
        0xD503_201F, // 0x1014: NOP
        0x0000_2050, // 0x1018: literal pool
        0x0000_0000,
    ];
    let mut bytes = vec![0u8; 0x1080];
    for (i, word) in words.iter().enumerate() {
        bytes[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
    // 0x2070 - 0x1000 = 0x1070
    bytes[0x1070..0x1076].copy_from_slice(b"hello\0");

    let path = dir.join("scenario.bin");
    fs::write(&path, bytes).expect("write image");
    path
}

#[test]
fn scan_recovers_the_literal_from_a_raw_image() {
    let dir = tempdir().expect("tempdir");
    let image = write_scenario_image(dir.path());

    cargo_bin_cmd!("swiftlit")
        .arg("scan")
        .arg(&image)
        .arg("--base")
        .arg("0x1000")
        .arg("--func")
        .arg("0x1000:0x1020")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hello\""))
        .stdout(predicate::str::contains("1 annotated"))
        .stdout(predicate::str::contains("defined at 0x1000"));
}

#[test]
fn scan_emits_parseable_json() {
    let dir = tempdir().expect("tempdir");
    let image = write_scenario_image(dir.path());

    let output = cargo_bin_cmd!("swiftlit")
        .arg("scan")
        .arg(&image)
        .arg("--base")
        .arg("0x1000")
        .arg("--func")
        .arg("0x1000:0x1020")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).expect("parse json");
    assert!(report["sha256"].as_str().is_some_and(|s| s.len() == 64));
    assert!(report["generated_at"].as_str().is_some());
    assert_eq!(report["functions"][0]["sites"][0]["literal"]["text"], "hello");
    assert_eq!(report["functions"][0]["sites"][0]["site"]["resolved_value"], 0x2050);
}

#[test]
fn scan_reports_skipped_sites_without_failing() {
    let dir = tempdir().expect("tempdir");
    // The site is present, but X8 never gets a value: two NOPs ahead of it.
    let words: [u32; 5] = [0xD503_201F, 0xD503_201F, 0xD100_8101, 0xB241_0101, 0xD65F_03C0];
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    let image = dir.path().join("unresolved.bin");
    fs::write(&image, bytes).expect("write image");

    cargo_bin_cmd!("swiftlit")
        .arg("scan")
        .arg(&image)
        .arg("--base")
        .arg("0x1000")
        .arg("--func")
        .arg("0x1000:0x1014")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 annotated"))
        .stdout(predicate::str::contains("skipped: unresolved register"));
}
