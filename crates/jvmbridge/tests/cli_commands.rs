#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "jvmbridge-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn jvmbridge(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jvmbridge"))
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("JVMBRIDGE_MAX_DEPTH")
        .env_remove("JVMBRIDGE_MAX_PAYLOAD")
        .output()
        .expect("jvmbridge should run")
}

#[test]
fn encode_then_inspect_round_trips() {
    let dir = unique_temp_dir("roundtrip");
    let payload = dir.join("call.bin");
    let payload_arg = payload.to_str().expect("utf-8 temp path");

    let output = jvmbridge(&[
        "--format",
        "json",
        "encode",
        "--target",
        "org.apache.spark.sql.api.dotnet.SQLUtils",
        "--method",
        "createDataFrame",
        "--static",
        "--pid",
        "77",
        "--args",
        r#"[1, 5000000000, 0.5, "x", [1.5, 2.5], {"k": true}, null]"#,
        "--out",
        payload_arg,
    ]);
    assert!(output.status.success(), "{output:?}");
    let written: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("encode summary is JSON");
    let size = std::fs::metadata(&payload).unwrap().len();
    assert_eq!(written["bytes"], serde_json::json!(size));

    let output = jvmbridge(&["--format", "json", "inspect", payload_arg]);
    assert!(output.status.success(), "{output:?}");
    let call: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("inspect output is JSON");
    assert_eq!(call["is_static"], true);
    assert_eq!(call["process_id"], 77);
    assert_eq!(call["method"], "createDataFrame");
    assert_eq!(call["total_length"], serde_json::json!(size - 4));

    let tags: Vec<&str> = call["args"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["tag_byte"].as_str().unwrap())
        .collect();
    assert_eq!(tags, ["i", "g", "d", "c", "l", "e", "n"]);
    assert_eq!(call["args"][4]["value"], serde_json::json!([1.5, 2.5]));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn encode_to_stdout_writes_raw_payload() {
    let output = jvmbridge(&["encode", "--target", "3", "--method", "count", "--pid", "1"]);
    assert!(output.status.success());

    let bytes = output.stdout;
    let total = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    assert_eq!(total as usize, bytes.len() - 4);
    // argCount is the last field of an argument-less call.
    assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
}

#[test]
fn encode_rejects_bad_arguments() {
    let output = jvmbridge(&["encode", "--target", "t", "--method", "m", "--args", "{"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--args is not valid JSON"));

    let output = jvmbridge(&["encode", "--target", "t", "--method", "m", "--args", "{}"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn inspect_reports_corrupt_payload_as_invalid_data() {
    let dir = unique_temp_dir("corrupt");
    let path = dir.join("bad.bin");
    // Header claims 3 bytes follow but only 1 does.
    std::fs::write(&path, [0, 0, 0, 3, 1]).unwrap();

    let output = jvmbridge(&["inspect", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn inspect_missing_file_fails() {
    let dir = unique_temp_dir("missing");
    let output = jvmbridge(&["inspect", dir.join("nope.bin").to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed opening"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn frames_lists_until_terminator() {
    let dir = unique_temp_dir("frames");
    let path = dir.join("rows.bin");
    let mut stream = Vec::new();
    for body in [&b"abc"[..], &b"defgh"[..]] {
        stream.extend_from_slice(&(body.len() as i32).to_be_bytes());
        stream.extend_from_slice(body);
    }
    stream.extend_from_slice(&0i32.to_be_bytes());
    stream.extend_from_slice(b"trailing garbage");
    std::fs::write(&path, &stream).unwrap();

    let output = jvmbridge(&["--format", "json", "frames", path.to_str().unwrap()]);
    assert!(output.status.success(), "{output:?}");
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing["frames"].as_array().unwrap().len(), 2);
    assert_eq!(listing["frames"][1]["size"], 5);
    assert_eq!(listing["total_bytes"], 8);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn frames_rejects_negative_length() {
    let dir = unique_temp_dir("negative");
    let path = dir.join("rows.bin");
    std::fs::write(&path, (-5i32).to_be_bytes()).unwrap();

    let output = jvmbridge(&["frames", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_reports_package_version() {
    let output = jvmbridge(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("jvmbridge "));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));

    let output = jvmbridge(&["version", "--extended"]);
    assert!(String::from_utf8_lossy(&output.stdout).contains("type_tags: 19"));
}
