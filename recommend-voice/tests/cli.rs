use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command isolated from the user's real config and API keys
fn recommend_cmd(config_dir: &TempDir) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("recommend-voice").into();
    cmd.env("RECOMMEND_VOICE_CONFIG_DIR", config_dir.path())
        .env("LLM_CLIENT_CONFIG_DIR", config_dir.path())
        .env_remove("GEMINI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// CLI Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    let temp_dir = TempDir::new().unwrap();
    recommend_cmd(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Asks an LLM which of the configured voices best suits the given text",
        ))
        .stdout(predicate::str::contains("--voices"));
}

#[test]
fn test_short_help_displays_about() {
    let temp_dir = TempDir::new().unwrap();
    recommend_cmd(&temp_dir)
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Recommend a synthetic voice"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_version_displays() {
    let temp_dir = TempDir::new().unwrap();
    recommend_cmd(&temp_dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("recommend-voice"));
}

// ============================================================================
// Prompt Rendering Tests
// ============================================================================

#[test]
fn test_dry_run_renders_default_prompt() {
    let temp_dir = TempDir::new().unwrap();
    recommend_cmd(&temp_dir)
        .args(["--dry-run", "Welcome", "to", "our", "store!"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "recommend a suitable voice from the available voices (Algenib, Achernar)",
        ))
        .stdout(predicate::str::contains("Text: Welcome to our store!\n"));
}

#[test]
fn test_dry_run_reads_stdin() {
    let temp_dir = TempDir::new().unwrap();
    recommend_cmd(&temp_dir)
        .arg("--dry-run")
        .write_stdin("Once upon a time\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Text: Once upon a time\n"));
}

#[test]
fn test_dry_run_accepts_empty_text() {
    let temp_dir = TempDir::new().unwrap();
    recommend_cmd(&temp_dir)
        .arg("--dry-run")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Text: \n"));
}

#[test]
fn test_voices_flag_overrides_list() {
    let temp_dir = TempDir::new().unwrap();
    recommend_cmd(&temp_dir)
        .args(["--dry-run", "--voices", "Kore, Puck", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("available voices (Kore, Puck)"));
}

#[test]
fn test_voice_names_with_braces_printed_verbatim() {
    let temp_dir = TempDir::new().unwrap();
    recommend_cmd(&temp_dir)
        .args(["--dry-run", "--voices", "{{text}},Voice{{1", "SECRET"])
        .assert()
        .success()
        .stdout(predicate::str::contains("available voices ({{text}}, Voice{{1)"))
        .stdout(predicate::str::contains("Text: SECRET"));
}

#[test]
fn test_blank_voice_rejected() {
    let temp_dir = TempDir::new().unwrap();
    recommend_cmd(&temp_dir)
        .args(["--dry-run", "--voices", "Kore,,Puck", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("blank voice name"));
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn test_config_file_voices_used() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("recommend-voice.toml"),
        "allowed_voices = [\"Charon\", \"Fenrir\", \"Leda\"]\n",
    )
    .unwrap();

    recommend_cmd(&temp_dir)
        .args(["--dry-run", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("available voices (Charon, Fenrir, Leda)"));
}

#[test]
fn test_invalid_config_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("recommend-voice.toml"), "strict = \"yes\"\n").unwrap();

    recommend_cmd(&temp_dir)
        .args(["--dry-run", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
}

// ============================================================================
// Provider Setup Tests (no network)
// ============================================================================

#[test]
fn test_missing_api_key_fails() {
    let temp_dir = TempDir::new().unwrap();
    recommend_cmd(&temp_dir)
        .arg("hello")
        .assert()
        .failure()
        .stderr(predicate::str::contains("gemini-flash"))
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn test_unknown_preset_fails() {
    let temp_dir = TempDir::new().unwrap();
    recommend_cmd(&temp_dir)
        .args(["--preset", "does-not-exist", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown preset: does-not-exist"));
}

#[test]
fn test_unknown_provider_in_llm_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("llm.toml"),
        r#"
default_preset = "odd"

[presets.odd]
provider = "carrier-pigeon"
model = "coo"
"#,
    )
    .unwrap();

    recommend_cmd(&temp_dir)
        .arg("hello")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown provider: carrier-pigeon"));
}
