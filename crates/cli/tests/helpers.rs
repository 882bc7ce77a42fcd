use std::fs;
use tempfile::tempdir;

use swiftlit::{parse_address, parse_func_range, sha256_file, ScanManifest};

#[test]
fn parse_address_accepts_hex_and_decimal() {
    assert_eq!(parse_address("0x1000").unwrap(), 0x1000);
    assert_eq!(parse_address("0X20").unwrap(), 0x20);
    assert_eq!(parse_address("4096").unwrap(), 4096);
    assert_eq!(parse_address(" 0x10 ").unwrap(), 0x10);
}

#[test]
fn parse_address_rejects_garbage() {
    assert!(parse_address("").is_err());
    assert!(parse_address("0x").is_err());
    assert!(parse_address("banana").is_err());
}

#[test]
fn parse_func_range_builds_a_function() {
    let function = parse_func_range("0x1000:0x1020").unwrap();
    assert_eq!((function.start, function.end), (0x1000, 0x1020));
}

#[test]
fn parse_func_range_rejects_bad_input() {
    assert!(parse_func_range("0x1000").is_err());
    assert!(parse_func_range("0x1000:0x1000").is_err());
    assert!(parse_func_range("x:y").is_err());
}

#[test]
fn sha256_file_hashes_contents() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("data.bin");
    fs::write(&path, b"abc").expect("write");

    let digest = sha256_file(&path).expect("hash");
    assert_eq!(
        digest,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn manifest_parses_addresses_and_ranges() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("funcs.yaml");
    fs::write(
        &path,
        "base: \"0x1000\"\nfunctions:\n  - start: \"0x1000\"\n    end: \"0x1020\"\n",
    )
    .expect("write manifest");

    let manifest = ScanManifest::load(&path).expect("load");
    assert_eq!(manifest.base_address().unwrap(), Some(0x1000));
    let functions = manifest.function_ranges().expect("ranges");
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].byte_len(), 0x20);
}

#[test]
fn manifest_base_is_optional() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("funcs.yaml");
    fs::write(&path, "functions:\n  - start: \"0\"\n    end: \"4\"\n").expect("write manifest");

    let manifest = ScanManifest::load(&path).expect("load");
    assert_eq!(manifest.base_address().unwrap(), None);
}
