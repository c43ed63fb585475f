// tests/config_tests/file.rs

// 配置文件加载与解析测试

use super::common::{create_temp_config_file, create_temp_yaml, TestConfigBuilder};
use dbproxy::config::Config;
use dbproxy::r#const::{listen_limits, session_limits, upstream_limits};

#[test]
fn test_config_from_file() {
    let config = TestConfigBuilder::new().build();
    let (_dir, file_path) = create_temp_config_file(&config);

    let loaded_config = Config::from_file(&file_path).unwrap();

    assert_eq!(loaded_config.listen.address, "127.0.0.1");
    assert_eq!(loaded_config.listen.port, 6432);
    assert_eq!(loaded_config.listen.backlog, 512);
    assert_eq!(loaded_config.upstream.host, "db.internal");
    assert_eq!(loaded_config.upstream.port, 5432);
    assert_eq!(loaded_config.upstream.connect_timeout, 5);
    assert!(!loaded_config.admin.enabled);
}

#[test]
fn test_config_from_file_invalid_path() {
    let result = Config::from_file("non_existent_file.yaml");
    assert!(result.is_err());
}

#[test]
fn test_config_from_file_invalid_content() {
    let (_dir, file_path) = create_temp_yaml("invalid: yaml: content:");
    let result = Config::from_file(&file_path);
    assert!(result.is_err());
}

#[test]
fn test_partial_config_uses_defaults() {
    let (_dir, file_path) = create_temp_yaml(
        r#"
upstream:
  host: 10.0.0.5
session:
  idle_timeout: 300
"#,
    );

    let config = Config::from_file(&file_path).unwrap();

    assert_eq!(config.listen.address, "0.0.0.0");
    assert_eq!(config.listen.port, listen_limits::DEFAULT_PORT);
    assert_eq!(config.listen.backlog, listen_limits::DEFAULT_BACKLOG);
    assert_eq!(config.upstream.host, "10.0.0.5");
    assert_eq!(config.upstream.port, upstream_limits::DEFAULT_PORT);
    assert!(config.upstream.nodelay);
    assert_eq!(config.session.idle_timeout, 300);
    assert_eq!(config.session.max_duration, 0);
    assert_eq!(config.session.max_connections, 0);
    assert_eq!(config.session.buffer_size, session_limits::DEFAULT_BUFFER_SIZE);
    assert_eq!(
        config.session.drain_timeout,
        session_limits::DEFAULT_DRAIN_TIMEOUT
    );
}

#[test]
fn test_file_without_upstream_host_is_rejected() {
    let (_dir, file_path) = create_temp_yaml(
        r#"
listen:
  port: 7000
"#,
    );

    let result = Config::from_file(&file_path);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Upstream host"));
}
