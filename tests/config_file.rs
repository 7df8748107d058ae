use frame_hub::{AppId, Chrome, ConfigError, Directory, HubConfig};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn load_reads_file_and_keeps_defaults_for_missing_keys() {
    let mut file = NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        "[hub]\ndump_messages = false\n\n[routes]\nblocked = [[\"ads\", \"wallet\"]]"
    )
    .unwrap();

    let config = HubConfig::load(file.path()).expect("load");
    assert!(!config.hub.dump_messages);
    assert_eq!(config.log, HubConfig::default().log);
    assert_eq!(
        config.routes.blocked,
        vec![["ads".to_string(), "wallet".to_string()]]
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nope.toml");
    let err = HubConfig::load(&path).expect_err("missing file");
    match err {
        ConfigError::Io { path: p, .. } => assert_eq!(p, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let err = HubConfig::from_toml_str("[hub]\ndump_messages = \"maybe\"").expect_err("bad type");
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn load_or_default_without_path_uses_embedded_config() {
    let config = HubConfig::load_or_default(None).unwrap();
    assert_eq!(config, HubConfig::default());
}

#[test]
fn blocked_routes_from_config_reach_the_directory() {
    let config = HubConfig::from_toml_str("[routes]\nblocked = [[\"A1\", \"A2\"]]").unwrap();
    let mut dir = Directory::from_routes(&config.routes);
    let a1 = dir.attach("A1").frame;
    let a2 = dir.attach("A2").frame;
    assert!(dir.is_blocked(&AppId::from("A1"), &AppId::from("A2")));
    assert_eq!(dir.frame_by_app_id(&AppId::from("A2"), a1), None);
    assert_eq!(dir.frame_by_app_id(&AppId::from("A1"), a2), Some(a1));
}
