// tests/config_tests/validation.rs

// 配置校验逻辑测试

use super::common::TestConfigBuilder;
use dbproxy::r#const::{session_limits, upstream_limits};
use dbproxy::server::SessionOptions;
use std::time::Duration;

#[test]
fn test_config_validation_valid() {
    let config = TestConfigBuilder::new().build();
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_invalid_listen_address() {
    let config = TestConfigBuilder::new()
        .map_config(|c| c.listen.address = "not-an-ip".to_string())
        .build();

    let result = config.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("listen address"));
}

#[test]
fn test_config_validation_upstream_port_zero() {
    let config = TestConfigBuilder::new()
        .map_config(|c| c.upstream.port = 0)
        .build();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_upstream_host_whitespace() {
    let config = TestConfigBuilder::new()
        .map_config(|c| c.upstream.host = "db internal".to_string())
        .build();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_connect_timeout_range() {
    let config = TestConfigBuilder::new()
        .map_config(|c| c.upstream.connect_timeout = upstream_limits::MAX_CONNECT_TIMEOUT + 1)
        .build();
    assert!(config.validate().is_err());

    let config = TestConfigBuilder::new()
        .map_config(|c| c.upstream.connect_timeout = 0)
        .build();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_buffer_size_range() {
    let config = TestConfigBuilder::new()
        .map_config(|c| c.session.buffer_size = session_limits::MIN_BUFFER_SIZE - 1)
        .build();
    assert!(config.validate().is_err());

    let config = TestConfigBuilder::new()
        .map_config(|c| c.session.buffer_size = session_limits::MAX_BUFFER_SIZE + 1)
        .build();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_admin_conflict() {
    let config = TestConfigBuilder::new()
        .map_config(|c| {
            c.admin.enabled = true;
            c.admin.address = "0.0.0.0".to_string();
            c.admin.port = c.listen.port;
        })
        .build();

    let result = config.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("conflicts"));

    // 管理服务未启用时不检查冲突
    let config = TestConfigBuilder::new()
        .map_config(|c| c.admin.port = c.listen.port)
        .build();
    assert!(config.validate().is_ok());
}

#[test]
fn test_session_options_from_config() {
    let config = TestConfigBuilder::new()
        .map_config(|c| {
            c.session.idle_timeout = 60;
            c.session.max_connections = 100;
        })
        .build();

    let options = SessionOptions::from_config(&config);
    assert_eq!(options.connect_timeout, Duration::from_secs(5));
    assert_eq!(options.idle_timeout, Some(Duration::from_secs(60)));
    assert_eq!(options.max_duration, None);
    assert_eq!(options.max_connections, Some(100));
    assert_eq!(
        options.drain_timeout,
        Duration::from_secs(session_limits::DEFAULT_DRAIN_TIMEOUT)
    );
}
