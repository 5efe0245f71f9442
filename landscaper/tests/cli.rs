use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::NamedTempFile;

const MANIFEST: &str = r#"
landscape:
  name: CLI landscape
  systems:
    - { id: dev, name: Development, host: dev.example.invalid, login: CLI_DEV_LOGIN, password: CLI_DEV_PASSWORD }
    - { id: qa, name: Quality, host: qa.example.invalid, login: CLI_QA_LOGIN, password: CLI_QA_PASSWORD }
  packages:
    - id: Orders
      artifacts:
        - id: OrderFlow
  environments:
    - { id: dev, name: Development, suffix: "", system: dev }
    - { id: qa, name: Quality, suffix: "-qa", system: qa }
  originalEnvironment: dev
"#;

fn landscape_file() -> NamedTempFile {
    let file = NamedTempFile::new().expect("Creating temp landscape file failed");
    write(file.path(), MANIFEST).expect("Writing temp landscape failed");
    file
}

/// Runs the binary with credentials for both systems and no terminal attached.
fn landscaper(file: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("landscaper").expect("Binary exists");
    cmd.arg("--landscape-file")
        .arg(file.path())
        .env("CLI_DEV_LOGIN", "dev-user")
        .env("CLI_DEV_PASSWORD", "dev-secret")
        .env("CLI_QA_LOGIN", "qa-user")
        .env("CLI_QA_PASSWORD", "qa-secret")
        .write_stdin("");
    cmd
}

#[test]
fn help_lists_the_command_groups() {
    let mut cmd = Command::cargo_bin("landscaper").expect("Binary exists");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("package")
                .and(predicate::str::contains("artifact"))
                .and(predicate::str::contains("config")),
        );
}

#[test]
fn missing_landscape_file_fails_before_any_remote_call() {
    let mut cmd = Command::cargo_bin("landscaper").expect("Binary exists");
    cmd.arg("--landscape-file")
        .arg("/nonexistent/landscape.yaml")
        .arg("check")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unable to read landscape configuration"));
}

#[test]
fn unset_credentials_fail_without_a_terminal() {
    let file = landscape_file();
    let mut cmd = Command::cargo_bin("landscaper").expect("Binary exists");
    cmd.arg("--landscape-file")
        .arg(file.path())
        .arg("check")
        .env_remove("CLI_DEV_LOGIN")
        .env_remove("CLI_DEV_PASSWORD")
        .env_remove("CLI_QA_LOGIN")
        .env_remove("CLI_QA_PASSWORD")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("environment variable CLI_DEV_LOGIN is not set"));
}

#[test]
fn unknown_environment_is_reported() {
    let file = landscape_file();
    landscaper(&file)
        .args(["--env", "prod", "--pkg", "Orders", "artifact", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("environment prod is not found"));
}

#[test]
fn move_into_the_original_environment_is_refused() {
    let file = landscape_file();
    landscaper(&file)
        .args(["--pkg", "Orders", "package", "move", "--target-env", "dev"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "cannot import changes into the original environment dev",
        ));
}

#[test]
fn config_update_requires_pairs() {
    let file = landscape_file();
    landscaper(&file)
        .args(["--artifact", "OrderFlow", "config", "update"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--config"));
}
