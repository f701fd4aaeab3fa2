//! CLI integration tests for VFC
//!
//! Runs the vfc binary on synthetic streams written to temp files and
//! checks what it reports.

mod common;

use common::*;
use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

// ============================================================================
// Helper Functions
// ============================================================================

/// Run vfc and return its output
fn run_vfc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vfc"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn stdout_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn temp_file_with(suffix: &str, data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).expect("Failed to create temp file");
    file.write_all(data).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

fn avc_file() -> (NamedTempFile, Vec<u8>) {
    let data = [
        avc_keyframe(40),
        annexb(&[&avc_aud(), &avc_p_slice(30)]),
        annexb(&[&avc_aud(), &avc_p_slice(24)]),
    ]
    .concat();
    (temp_file_with(".264", &data), data)
}

fn json_report(output: &Output) -> serde_json::Value {
    serde_json::from_str(&stdout_string(output)).expect("assemble --json prints JSON")
}

// ============================================================================
// Codecs
// ============================================================================

#[test]
fn test_codecs_listing() {
    let output = run_vfc(&["codecs"]);
    assert!(output.status.success(), "stderr: {}", stderr_string(&output));

    let stdout = stdout_string(&output);
    assert!(stdout.contains("Supported Codecs"));
    for name in ["H.264", "H.265", "VC-1", "VP8", "VP9"] {
        assert!(stdout.contains(name), "missing {} in:\n{}", name, stdout);
    }
}

#[test]
fn test_version_flag() {
    let output = run_vfc(&["--version"]);
    assert!(output.status.success());
    assert!(stdout_string(&output).contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// Assemble
// ============================================================================

#[test]
fn test_assemble_avc_text() {
    let (file, _) = avc_file();
    let path = file.path().to_str().unwrap();

    let output = run_vfc(&["assemble", path, "-c", "h264"]);
    assert!(output.status.success(), "stderr: {}", stderr_string(&output));

    let stdout = stdout_string(&output);
    assert!(stdout.contains("Frame constructor report"));
    assert!(stdout.contains("1280x720"));
    assert!(stdout.contains("Interlaced:      false"));
}

#[test]
fn test_assemble_avc_json() {
    let (file, data) = avc_file();
    let path = file.path().to_str().unwrap();

    let output = run_vfc(&["assemble", path, "--codec", "avc", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr_string(&output));

    let report = json_report(&output);
    assert_eq!(report["codec"], "h264");
    assert_eq!(report["bytes_in"], data.len() as u64);
    assert_eq!(report["bytes_out"], data.len() as u64);
    assert_eq!(report["bitstreams"], 3);
    assert_eq!(report["sync_frames"], 1);
    assert_eq!(report["interlaced"], false);
    assert_eq!(report["sps"]["width"], 1280);
    assert_eq!(report["sps"]["height"], 720);
}

#[test]
fn test_assemble_avc_chunked_matches_whole() {
    let (file, data) = avc_file();
    let path = file.path().to_str().unwrap();

    let output = run_vfc(&["assemble", path, "-c", "h264", "--chunk", "9", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr_string(&output));

    let report = json_report(&output);
    assert_eq!(report["bytes_out"], data.len() as u64);
    assert_eq!(report["bitstreams"], 3);
    assert!(report["loads"].as_u64().unwrap() > 3);
    assert!(report["buffer"]["copied_bytes"].as_u64().unwrap() > 0);
}

#[test]
fn test_assemble_vp8_ivf() {
    let frames = vec![vp8_key_frame(), vp8_inter_frame(), vp8_inter_frame()];
    let total: usize = frames.iter().map(Vec::len).sum();
    let file = temp_file_with(".ivf", &ivf(b"VP80", &frames));

    let output = run_vfc(&[
        "assemble",
        file.path().to_str().unwrap(),
        "-c",
        "vp8",
        "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr_string(&output));

    let report = json_report(&output);
    assert_eq!(report["bitstreams"], 3);
    assert_eq!(report["sync_frames"], 1);
    assert_eq!(report["bytes_out"], total as u64);
    assert!(report["sps"].is_null());
}

#[test]
fn test_assemble_with_config_file() {
    let (file, data) = avc_file();
    let config = temp_file_with(
        ".json",
        br#"{ "initial_buffer_size": 128, "growth": "exact" }"#,
    );

    let output = run_vfc(&[
        "assemble",
        file.path().to_str().unwrap(),
        "-c",
        "h264",
        "--config",
        config.path().to_str().unwrap(),
        "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr_string(&output));
    assert_eq!(json_report(&output)["bytes_out"], data.len() as u64);
}

#[test]
fn test_assemble_rejects_bad_config() {
    let (file, _) = avc_file();
    let config = temp_file_with(".json", br#"{ "no_such_option": true }"#);

    let output = run_vfc(&[
        "assemble",
        file.path().to_str().unwrap(),
        "-c",
        "h264",
        "--config",
        config.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(stderr_string(&output).contains("Failed to load config"));
}

#[test]
fn test_assemble_unknown_codec() {
    let (file, _) = avc_file();
    let output = run_vfc(&["assemble", file.path().to_str().unwrap(), "-c", "mpeg2"]);
    assert!(!output.status.success());
    assert!(stderr_string(&output).contains("Unsupported codec"));
}

#[test]
fn test_assemble_missing_file() {
    let output = run_vfc(&["assemble", "/nonexistent/stream.264", "-c", "h264"]);
    assert!(!output.status.success());
    assert!(stderr_string(&output).contains("Failed to read"));
}

#[test]
fn test_assemble_vp9_rejects_non_ivf() {
    let file = temp_file_with(".ivf", &vp9_key_frame());
    let output = run_vfc(&["assemble", file.path().to_str().unwrap(), "-c", "vp9"]);
    assert!(!output.status.success());
}

// ============================================================================
// Strip
// ============================================================================

#[test]
fn test_strip_avc() {
    let data = [
        avc_keyframe(40),
        annexb(&[&avc_aud(), &avc_p_slice(30)]),
    ]
    .concat();
    let input = temp_file_with(".264", &data);
    let out = NamedTempFile::with_suffix(".264").unwrap();

    let output = run_vfc(&[
        "strip",
        input.path().to_str().unwrap(),
        "-c",
        "h264",
        "-o",
        out.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr_string(&output));
    assert!(stdout_string(&output).contains("Stripped"));

    let stripped = std::fs::read(out.path()).unwrap();
    let expected = annexb(&[&avc_idr(40), &avc_p_slice(30)]);
    assert_eq!(stripped, expected);
}

#[test]
fn test_strip_rejects_vp8() {
    let input = temp_file_with(".ivf", &ivf(b"VP80", &[vp8_key_frame()]));
    let out = NamedTempFile::new().unwrap();

    let output = run_vfc(&[
        "strip",
        input.path().to_str().unwrap(),
        "-c",
        "vp8",
        "-o",
        out.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(stderr_string(&output).contains("h264 and h265"));
}
