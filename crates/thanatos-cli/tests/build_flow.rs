#![cfg(unix)]

use std::fs;
use std::path::Path;

use serde_json::json;
use thanatos_cli::commands::build::{run, BuildArgs};

fn write_config(dir: &Path, agent_root: &Path) -> std::path::PathBuf {
    let path = dir.join("thanatos-builder.yaml");
    fs::write(
        &path,
        format!(
            "agent_code_path: {}\nlist_targets_command: \"echo x86_64-unknown-linux-gnu\"\n",
            agent_root.display()
        ),
    )
    .expect("write config");
    path
}

fn write_request(dir: &Path, body: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("request.json");
    fs::write(&path, body.to_string()).expect("write request");
    path
}

#[test]
fn build_writes_payload_to_output() {
    let work = tempfile::tempdir().expect("temp dir");
    let agent = work.path().join("agent");
    fs::create_dir_all(&agent).expect("create agent dir");
    let config = write_config(work.path(), &agent);
    let request = write_request(
        work.path(),
        json!({
            "profiles": ["http"],
            "outputFormat": "executable",
            "selectedOS": "Linux",
            "buildCommand": "mkdir -p target/x86_64-unknown-linux-gnu/release && printf 'agent' > target/x86_64-unknown-linux-gnu/release/thanatos_http_binary"
        }),
    );
    let output = work.path().join("out").join("payload.bin");

    let result = run(BuildArgs {
        request,
        build_id: "41".to_string(),
        output: output.clone(),
        config,
        command: None,
    })
    .expect("build");

    assert_eq!(result.artifact_path, output);
    assert_eq!(fs::read(&output).expect("read payload"), b"agent");
    assert_eq!(
        result.sha256,
        "d4f0bc5a29de06b510f9aa428f1eedba926012b591fef7a518e776a7c9bd1824"
    );
}

#[test]
fn command_override_replaces_request_command() {
    let work = tempfile::tempdir().expect("temp dir");
    let agent = work.path().join("agent");
    fs::create_dir_all(&agent).expect("create agent dir");
    let config = write_config(work.path(), &agent);
    let request = write_request(
        work.path(),
        json!({
            "profiles": ["http"],
            "outputFormat": "executable",
            "selectedOS": "Linux",
            "buildCommand": "exit 1"
        }),
    );

    let error = run(BuildArgs {
        request,
        build_id: "42".to_string(),
        output: work.path().join("payload.bin"),
        config,
        command: Some("echo 'overridden' >&2; exit 3".to_string()),
    })
    .err()
    .expect("build failed");

    let message = format!("{:#}", error);
    assert!(message.contains("overridden"));
    assert!(!work.path().join("payload.bin").exists());
}

#[test]
fn missing_profile_is_reported_without_output() {
    let work = tempfile::tempdir().expect("temp dir");
    let agent = work.path().join("agent");
    fs::create_dir_all(&agent).expect("create agent dir");
    let config = write_config(work.path(), &agent);
    let request = write_request(
        work.path(),
        json!({
            "profiles": [],
            "outputFormat": "shared_library",
            "selectedOS": "Windows"
        }),
    );

    let error = run(BuildArgs {
        request,
        build_id: "43".to_string(),
        output: work.path().join("payload.dll"),
        config,
        command: None,
    })
    .err()
    .expect("build failed");

    assert!(error.to_string().contains("no C2 profile selected"));
    assert!(!work.path().join("payload.dll").exists());
}

#[test]
fn configured_endpoint_receives_every_step() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/build-step")
        .match_body(mockito::Matcher::PartialJson(json!({ "buildId": "44", "success": true })))
        .with_status(200)
        .expect(4)
        .create();

    let work = tempfile::tempdir().expect("temp dir");
    let agent = work.path().join("agent");
    fs::create_dir_all(&agent).expect("create agent dir");
    let config = work.path().join("thanatos-builder.yaml");
    fs::write(
        &config,
        format!(
            "agent_code_path: {}\nlist_targets_command: \"echo x86_64-unknown-linux-gnu\"\nreporter:\n  endpoint: {}/build-step\n",
            agent.display(),
            server.url()
        ),
    )
    .expect("write config");
    let request = write_request(
        work.path(),
        json!({
            "profiles": ["http"],
            "outputFormat": "executable",
            "selectedOS": "Linux",
            "buildCommand": "mkdir -p target/x86_64-unknown-linux-gnu/release && printf 'agent' > target/x86_64-unknown-linux-gnu/release/thanatos_http_binary"
        }),
    );

    run(BuildArgs {
        request,
        build_id: "44".to_string(),
        output: work.path().join("payload.bin"),
        config,
        command: None,
    })
    .expect("build");

    mock.assert();
}
