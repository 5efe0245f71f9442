use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::NamedTempFile;

use landscaper::credentials::PromptingCredentials;
use landscaper::load_landscape::load_landscape_with;

const MANIFEST: &str = r#"
landscape:
  name: Loader landscape
  systems:
    - { id: dev, name: Development, host: dev.example.com, login: LOADER_DEV_LOGIN, password: LOADER_DEV_PASSWORD }
  packages: []
  environments:
    - { id: dev, name: Development, suffix: "", system: dev }
  originalEnvironment: dev
"#;

fn manifest_file() -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), MANIFEST).expect("write manifest");
    file
}

#[test]
#[serial]
fn landscape_loads_with_credentials_from_the_environment() {
    let file = manifest_file();
    env::set_var("LOADER_DEV_LOGIN", "user");
    env::set_var("LOADER_DEV_PASSWORD", "secret");

    let landscape = load_landscape_with(file.path(), &PromptingCredentials::non_interactive())
        .expect("landscape should load");

    assert_eq!(landscape.name(), "Loader landscape");
    assert_eq!(landscape.original_environment().id, "dev");
    let client = landscape
        .client_for_environment("dev")
        .expect("dev has a client");
    assert_eq!(client.base_url(), "https://dev.example.com/api/v1");

    env::remove_var("LOADER_DEV_LOGIN");
    env::remove_var("LOADER_DEV_PASSWORD");
}

#[test]
#[serial]
fn blank_credentials_are_not_prompted_for_without_a_terminal() {
    let file = manifest_file();
    env::set_var("LOADER_DEV_LOGIN", "  ");
    env::remove_var("LOADER_DEV_PASSWORD");

    let err = load_landscape_with(file.path(), &PromptingCredentials::non_interactive())
        .expect_err("blank login is rejected");

    let chain = format!("{err:#}");
    assert!(chain.contains("unable to read landscape configuration"));
    assert!(chain.contains("LOADER_DEV_LOGIN"));

    env::remove_var("LOADER_DEV_LOGIN");
}
