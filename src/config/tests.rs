use super::*;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let config = load_from(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
    assert_eq!(config, PipelineConfig::default());
    assert_eq!(config.data.shuffle_buffer_size(), 640);
}

#[test]
fn partial_tables_fill_in_defaults() {
    let config = parse(
        r#"
        [data]
        mixin_prob = 0.75
        batch_size = 8
        seed = 42
        "#,
    )
    .unwrap();
    assert!((config.data.mixin_prob - 0.75).abs() < f32::EPSILON);
    assert_eq!(config.data.batch_size, 8);
    assert_eq!(config.data.seed, 42);
    assert!((config.data.window_size_s - 5.0).abs() < f32::EPSILON);
    assert_eq!(config.data.shuffle_buffer_size(), 80);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn saves_and_reloads_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
    let mut config = PipelineConfig::default();
    config.data.min_gain = 0.2;
    config.data.max_gain = 0.4;
    config.data.shuffle_buffer = Some(32);
    config.logging.dir = Some(dir.path().join("logs"));
    save_to(&config, &path).unwrap();
    assert_eq!(load_from(&path).unwrap(), config);
}

#[test]
fn rejects_out_of_range_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[data]\nmixin_prob = 1.5\n").unwrap();
    let err = load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "mixin_prob", .. }));

    std::fs::write(&path, "[data]\nmax_gain = inf\n").unwrap();
    let err = load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "max_gain", .. }));
    let parsed = parse("[data]\nwindow_size_s = inf\n").unwrap();
    assert!(matches!(
        parsed.validate(),
        Err(ConfigError::Invalid { field: "window_size_s", .. })
    ));
    let parsed = parse("[data]\nmin_gain = nan\n").unwrap();
    assert!(matches!(
        parsed.validate(),
        Err(ConfigError::Invalid { field: "min_gain", .. })
    ));

    let mut data = DataConfig::default();
    data.max_gain = 0.1;
    assert!(matches!(
        data.validate(),
        Err(ConfigError::Invalid { field: "max_gain", .. })
    ));
    data = DataConfig {
        batch_size: 0,
        ..DataConfig::default()
    };
    assert!(matches!(
        data.validate(),
        Err(ConfigError::Invalid { field: "batch_size", .. })
    ));
}

#[test]
fn reports_parse_errors_with_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[data\nbatch_size = ").unwrap();
    assert!(matches!(
        load_from(&path),
        Err(ConfigError::ParseToml { .. })
    ));
}
