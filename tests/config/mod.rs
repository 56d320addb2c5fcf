use std::path::PathBuf;

use datarepo::DatabaseConfig;
use datarepo::error::ConfigError;

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("datarepo.toml");
    std::fs::write(&path, contents).expect("Failed to write config");
    (dir, path)
}

#[test]
fn load_from_file() {
    let (_dir, path) = write_config(
        r#"
        path = "/srv/bookings/data.db"
        busyTimeoutMs = 750
        "#,
    );
    let cfg = DatabaseConfig::load_from(&path).unwrap();
    assert_eq!(cfg.path, PathBuf::from("/srv/bookings/data.db"));
    assert_eq!(cfg.busy_timeout_ms, Some(750));
    assert!(cfg.foreign_keys);
}

#[test]
fn file_values_yield_to_environment() {
    let (_dir, path) = write_config(r#"path = "from-file.db""#);
    let cfg = DatabaseConfig::load_from(&path)
        .unwrap()
        .with_overrides(|key| (key == "DB_PATH").then(|| "from-env.db".to_owned()))
        .unwrap();
    assert_eq!(cfg.path, PathBuf::from("from-env.db"));
}

#[test]
fn parse_errors_name_the_file() {
    let (_dir, path) = write_config("busyTimeoutMs = \"soon\"");
    let err = DatabaseConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(ref p, _) if *p == path));
    assert!(err.to_string().contains("datarepo.toml"), "{err}");
}

#[cfg(feature = "rusqlite")]
#[test]
fn connector_from_config() {
    use datarepo::{Connector, RusqliteConnector};

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let cfg = DatabaseConfig {
        path: dir.path().join("configured.db"),
        busy_timeout_ms: Some(200),
        foreign_keys: true,
    };
    let connector = RusqliteConnector::from_config(&cfg);
    assert_eq!(connector.path(), cfg.path.as_path());

    let conn = connector.connect().unwrap();
    let enabled: i64 = conn
        .conn()
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}
