use super::*;

#[test]
fn test_empty_file_is_all_defaults() {
    let config = AppConfig::parse("").unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.paths.profile, PathBuf::from("learning_data.json"));
    assert_eq!(config.paths.report, PathBuf::from("lvl.txt"));
    assert_eq!(config.clock.initial_secs, 600);
    assert!(config.engine.use_book);
    assert_eq!(config.network.port, None);
}

#[test]
fn test_partial_sections_keep_other_defaults() {
    let config = AppConfig::parse(
        r#"
        [network]
        port = 5555
        read_timeout_secs = 30

        [clock]
        increment_secs = 3
        "#,
    )
    .unwrap();
    assert_eq!(config.network.port, Some(5555));
    assert_eq!(config.network.bind_addr, "0.0.0.0");
    assert_eq!(config.clock.initial_secs, 600);
    assert_eq!(config.clock.increment_secs, 3);

    let net = config.network.to_net_config();
    assert_eq!(net.port, Some(5555));
    assert_eq!(net.read_timeout, Duration::from_secs(30));
    assert_eq!(net.connect_timeout, Duration::from_secs(10));
}

#[test]
fn test_invalid_toml_is_reported() {
    assert!(AppConfig::parse("[clock]\ninitial_secs = \"ten\"").is_err());
}

#[test]
fn test_missing_file_loads_defaults() {
    let path = std::env::temp_dir().join(format!("missing-{}.toml", uuid::Uuid::new_v4()));
    assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
}

#[test]
fn test_load_reads_file() {
    let path = std::env::temp_dir().join(format!("config-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, "[engine]\nuse_book = false\n").unwrap();
    let config = AppConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert!(!config.engine.use_book);
}
