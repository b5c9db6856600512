//! Configuration files on disk

use pianola::{Config, ConfigError, SequencerError, Stage};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_custom_config() {
    let file = write_config(
        r#"(
            timing: (min: 0.1, max: 2.0),
            default_timing: 0.25,
            instruments: ["harp", "celesta"],
            default_instrument: "celesta",
            max_peers: Some(2),
        )"#,
    );

    let config = Config::from_path(file.path()).unwrap();
    assert_eq!(config.default_timing, 0.25);
    assert_eq!(config.max_peers, Some(2));
    assert_eq!(config.catalog().unwrap().default_instrument().name(), "celesta");
}

#[test]
fn test_config_drives_the_stage() {
    let file = write_config(
        r#"(
            timing: (min: 0.1, max: 2.0),
            instruments: ["harp"],
            default_instrument: "harp",
            limits: (max_tokens: 2),
        )"#,
    );
    let config = Config::from_path(file.path()).unwrap();
    let (mut stage, _rx) = Stage::with_virtual_clock(config).unwrap();
    let device = stage.add_device();

    assert!(matches!(
        stage.set_timing(device, 3.0),
        Err(SequencerError::OutOfRange { max, .. }) if max == 2.0
    ));
    assert!(matches!(
        stage.set_instrument(device, "piano"),
        Err(SequencerError::InvalidInstrument(_))
    ));

    stage.set_notes(device, "C D E").unwrap();
    assert_eq!(stage.device(device).unwrap().schedule().len(), 2);
    assert_eq!(stage.device(device).unwrap().instrument().unwrap().name(), "harp");
}

#[test]
fn test_save_and_reload() {
    let config = Config {
        default_timing: 1.5,
        max_peers: Some(4),
        ..Config::default()
    };
    let file = write_config(&config.to_ron_string().unwrap());
    assert_eq!(Config::from_path(file.path()).unwrap(), config);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_path(&dir.path().join("absent.ron"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_default_timing_outside_bounds_is_invalid() {
    let file = write_config("(timing: (min: 0.1, max: 1.0), default_timing: 2.0)");
    assert!(matches!(
        Config::from_path(file.path()),
        Err(ConfigError::Invalid(_))
    ));
}
