//! End-to-end tests of the `comfyops` binary.
//!
//! Only paths that need no ComfyUI server and no internet are exercised:
//! argument handling, dry-run planning, exit codes.

use std::io::Write;
use std::net::TcpListener;
use std::process::{Command, Output, Stdio};

fn comfyops() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_comfyops"));
    cmd.env_remove("COMFYUI_HOST")
        .env_remove("COMFYUI_PORT")
        .env_remove("COMFYUI_BASE")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null());
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn resolve_prints_category_and_path() {
    let base = tempfile::tempdir().unwrap();
    let output = comfyops()
        .args(["resolve", "--base"])
        .arg(base.path())
        .args([
            "https://h/sdxl_vae.safetensors",
            "https://h/detail-tweaker.safetensors loras",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    let models = base.path().join("models");

    assert_eq!(
        lines,
        vec![
            format!("vae\t{}", models.join("vae/sdxl_vae.safetensors").display()),
            format!("loras\t{}", models.join("loras/detail-tweaker.safetensors").display()),
        ]
    );
    assert!(!models.exists(), "resolve must not create directories");
}

#[test]
fn resolve_reads_stdin_when_no_urls() {
    let base = tempfile::tempdir().unwrap();
    let mut child = comfyops()
        .args(["resolve", "--subfolder", "upscale_models", "--base"])
        .arg(base.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"# upscalers\n\nhttps://h/4x-ultra.pth\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("upscale_models\t"));
    assert!(text.trim_end().ends_with("4x-ultra.pth"));
}

#[test]
fn download_into_missing_base_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = comfyops()
        .args(["download", "--no-pget", "--base"])
        .arg(dir.path().join("no-such-comfyui"))
        .arg("https://h/x.safetensors")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(78));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ComfyUI base not found"));
}

#[test]
fn existing_files_are_skipped_and_exit_zero() {
    let base = tempfile::tempdir().unwrap();
    let checkpoints = base.path().join("models/checkpoints");
    std::fs::create_dir_all(&checkpoints).unwrap();
    std::fs::write(checkpoints.join("flux1-dev.safetensors"), b"weights").unwrap();

    let output = comfyops()
        .args(["download", "--no-pget", "--json", "--base"])
        .arg(base.path())
        .arg("https://h/flux1-dev.safetensors")
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["results"][0]["outcome"], "skipped");
    assert_eq!(report["summary"]["skipped"], 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("0 downloaded, 1 skipped, 0 failed"));
}

#[test]
fn any_failed_entry_exits_one() {
    let base = tempfile::tempdir().unwrap();
    let port = closed_port();
    let output = comfyops()
        .args(["download", "--no-pget", "--base"])
        .arg(base.path())
        .arg(format!("http://127.0.0.1:{port}/lora_a.safetensors"))
        .arg("ftp://h/lora_b.safetensors")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(&format!("error http://127.0.0.1:{port}/lora_a.safetensors: ")));
    assert!(lines[1].starts_with("error ftp://h/lora_b.safetensors: Invalid URL"));
}

#[test]
fn invalid_workflow_is_reported_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let workflow = dir.path().join("wf.json");
    std::fs::write(&workflow, "{ not json").unwrap();

    let output = comfyops()
        .args(["run", "--port", "1", "--workflow"])
        .arg(&workflow)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(65));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["error"], "invalid_workflow");
}

#[test]
fn unreachable_server_prints_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let workflow = dir.path().join("wf.json");
    std::fs::write(&workflow, r#"{"3": {"class_type": "KSampler", "inputs": {}}}"#).unwrap();

    let output = comfyops()
        .args(["run", "--host", "127.0.0.1", "--port"])
        .arg(closed_port().to_string())
        .arg("--workflow")
        .arg(&workflow)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(69));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["error"], "connection_error");
    assert!(doc.get("prompt_id").is_none());
}

#[test]
fn paths_lists_locations() {
    let output = comfyops()
        .args(["paths", "--base", "/srv/ComfyUI"])
        .env("COMFYOPS_BIN_DIR", "/opt/comfyops/bin")
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("comfy_base = /srv/ComfyUI"));
    assert!(text.contains("models_dir = /srv/ComfyUI/models"));
    assert!(text.contains("tool_bin_dir = /opt/comfyops/bin"));
}
