//! Config loading from a TOML file plus environment overrides.

use gatto::config::BotConfig;
use std::io::Write;

#[test]
fn file_then_env_then_validate() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[gatto]
max_retries = 5

[telegram]
chat_id = 10

[schedule]
apply_time = "04:30"
"#
    )
    .unwrap();

    let mut config = BotConfig::from_file(file.path()).unwrap();
    assert_eq!(config.gatto.max_retries, 5);
    assert_eq!(config.telegram.chat_id, Some(10));

    config
        .apply_env(|key| match key {
            "CHAT_ID" => Some("20".to_owned()),
            "TASK_TIMEOUT" => Some("90".to_owned()),
            _ => None,
        })
        .unwrap();
    config.validate().unwrap();

    assert_eq!(config.telegram.chat_id, Some(20));
    assert_eq!(config.worker.task_timeout_secs, 90);
    assert_eq!(config.gatto.max_retries, 5);
    assert_eq!(config.schedule.apply_time, "04:30");
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(BotConfig::from_file(&dir.path().join("absent.toml")).is_err());
}
