use page_indexer::Settings;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_env_override_with_custom_format() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    std::fs::write(
        &config_path,
        r#"
cluster_config_name = "from-file.json"

[index]
timeout_secs = 5
default_port = 9201
"#,
    )
    .unwrap();

    unsafe {
        // Use double underscore to separate nested levels
        env::set_var("PI_STATE_DIR", "/tmp/page-indexer-env");
        env::set_var("PI_INDEX__TIMEOUT_SECS", "7");
        env::set_var("PI_WATCHER__CHANNEL_CAPACITY", "12");
        env::set_var("PI_LOGGING__FILE", "false");
    }

    let settings = Settings::load_from(&config_path).unwrap();

    unsafe {
        // Clean up
        env::remove_var("PI_STATE_DIR");
        env::remove_var("PI_INDEX__TIMEOUT_SECS");
        env::remove_var("PI_WATCHER__CHANNEL_CAPACITY");
        env::remove_var("PI_LOGGING__FILE");
    }

    // Environment wins over the file
    assert_eq!(settings.state_dir(), PathBuf::from("/tmp/page-indexer-env"));
    assert_eq!(settings.index.timeout_secs, 7);
    assert_eq!(settings.watcher.channel_capacity, 12);
    assert!(!settings.logging.file);

    // File wins over defaults
    assert_eq!(settings.cluster_config_name, "from-file.json");
    assert_eq!(settings.index.default_port, 9201);

    // Defaults fill the rest
    assert_eq!(settings.index.scheme, "http");
    assert_eq!(settings.index.doc_type, "page");
}
