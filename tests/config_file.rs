use tempfile::tempdir;
use woopra::TrackerConfig;

#[test]
fn explicit_file_overrides_defaults_and_keeps_the_rest() {
    let dir = tempdir().expect("failed to create temp dir for test");
    let path = dir.path().join("woopra.toml");
    std::fs::write(
        &path,
        r#"
domain = "ralphsamuel.io"
idle_timeout = 60000
"#,
    )
    .unwrap();

    let cfg = TrackerConfig::load(path.to_str()).expect("config file should load");

    assert_eq!(cfg.domain, "ralphsamuel.io");
    assert_eq!(cfg.idle_timeout, 60000);
    assert_eq!(cfg.cookie_name, "wooTracker");
    assert_eq!(cfg.cookie_path, "/");
}

#[test]
fn unknown_file_key_is_a_load_error() {
    let dir = tempdir().expect("failed to create temp dir for test");
    let path = dir.path().join("woopra.toml");
    std::fs::write(&path, "no_such_option = true\n").unwrap();

    assert!(TrackerConfig::load(path.to_str()).is_err());
}

#[test]
fn env_source_fills_in_when_no_file_is_given() {
    // the only test touching process env, keep it that way
    std::env::set_var("WOOPRA__DOMAIN", "env.example");
    let cfg = TrackerConfig::load(None).expect("env-only config should load");
    std::env::remove_var("WOOPRA__DOMAIN");

    assert_eq!(cfg.domain, "env.example");
}
