//! Binary smoke tests against the in-memory corpus.
#![allow(missing_docs, reason = "integration test crate")]

use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output, Stdio};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const ENV_ALIASES: &[&str] = &[
    "QDRANT_URL",
    "QDRANT_API_KEY",
    "QDRANT_COLLECTION_NAME",
    "OPENAI_API_KEY",
    "LOG_LEVEL",
    "HOST",
    "PORT",
    "RUST_LOG",
];

fn command(args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_hybrid-rag"));
    command.args(args).current_dir(env!("CARGO_MANIFEST_DIR"));
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().starts_with("HRAG_") {
            command.env_remove(key);
        }
    }
    for key in ENV_ALIASES {
        command.env_remove(key);
    }
    command
}

fn run(args: &[&str]) -> std::io::Result<Output> {
    command(args).output()
}

#[test]
fn config_show_prints_defaults_as_json() -> TestResult {
    let output = run(&["config", "show"])?;
    assert!(output.status.success());

    let config: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(config["vectorStore"]["collectionName"], "documents");
    assert_eq!(config["search"]["defaultLimit"], 10);
    assert_eq!(config["server"]["transport"], "stdio");
    Ok(())
}

#[test]
fn config_show_redacts_secrets() -> TestResult {
    let output = command(&["config", "show", "--format", "toml"])
        .env("OPENAI_API_KEY", "sk-do-not-print")
        .output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("[embedding]"));
    assert!(!stdout.contains("sk-do-not-print"));
    Ok(())
}

#[test]
fn config_check_rejects_bad_env() -> TestResult {
    let output = command(&["config", "check"])
        .env("HRAG_SERVER_PORT", "not-a-port")
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr)?.starts_with("error:"));
    Ok(())
}

#[test]
fn search_prints_fused_results() -> TestResult {
    let output = run(&[
        "search",
        "--config",
        "tests/fixtures/config.json",
        "--query",
        "token refresh",
        "--source-type",
        "jira",
        "--limit",
        "2",
    ])?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let response: Value = serde_json::from_slice(&output.stdout)?;
    let results = response["results"].as_array().ok_or("missing results")?;
    assert!(!results.is_empty() && results.len() <= 2);
    assert!(results.iter().all(|hit| hit["source_type"] == "jira"));
    assert_eq!(results[0]["source_title"], "GW-142");
    Ok(())
}

#[test]
fn search_rejects_unknown_source_type() -> TestResult {
    let output = run(&[
        "search",
        "--config",
        "tests/fixtures/config.json",
        "--query",
        "anything",
        "--source-type",
        "slack",
    ])?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}

#[test]
fn serve_answers_on_stdio_and_exits_at_eof() -> TestResult {
    let mut child = command(&["serve", "--config", "tests/fixtures/config.json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    {
        let mut stdin = child.stdin.take().ok_or("stdin not captured")?;
        writeln!(
            stdin,
            r#"{{"jsonrpc":"2.0","id":1,"method":"search","params":{{"query":"deployment runbook","limit":3}}}}"#
        )?;
        writeln!(stdin, r#"{{"jsonrpc":"2.0","method":"listOfferings"}}"#)?;
        writeln!(stdin, r#"{{"jsonrpc":"2.0","id":2,"method":"unknown"}}"#)?;
    }

    let output = child.wait_with_output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let replies: Vec<Value> = stdout
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["id"], 1);
    assert!(replies[0]["result"]["results"].is_array());
    assert_eq!(replies[1]["id"], 2);
    assert_eq!(replies[1]["error"]["code"], -32601);
    Ok(())
}
