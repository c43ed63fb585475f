// tests/config_tests/env.rs

// 环境变量覆盖测试，通过注入查找函数避免修改真实的进程环境

use super::common::TestConfigBuilder;
use dbproxy::config::Config;
use std::collections::HashMap;

fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_env_only_configuration() {
    let mut config = Config::default();
    config
        .apply_overrides_from(lookup_from(&[
            ("LOCAL_PORT", "6543"),
            ("REMOTE_DB_HOST", "postgres.internal"),
            ("REMOTE_DB_PORT", "5432"),
        ]))
        .unwrap();

    assert!(config.validate().is_ok());

    let target = config.target().unwrap();
    assert_eq!(target.listen_addr().to_string(), "0.0.0.0:6543");
    assert_eq!(target.upstream_host(), "postgres.internal");
    assert_eq!(target.upstream_port(), 5432);
    assert_eq!(target.upstream_authority(), "postgres.internal:5432");
}

#[test]
fn test_env_overrides_file_values() {
    let mut config = TestConfigBuilder::new().build();
    config
        .apply_overrides_from(lookup_from(&[("REMOTE_DB_HOST", "replica.internal")]))
        .unwrap();

    // 未设置的变量保持文件中的值
    assert_eq!(config.listen.port, 6432);
    assert_eq!(config.upstream.host, "replica.internal");
    assert_eq!(config.upstream.port, 5432);
}

#[test]
fn test_env_invalid_port_is_rejected() {
    let mut config = Config::default();
    let result = config.apply_overrides_from(lookup_from(&[("REMOTE_DB_PORT", "not-a-port")]));
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("REMOTE_DB_PORT"));

    let result = config.apply_overrides_from(lookup_from(&[("LOCAL_PORT", "70000")]));
    assert!(result.is_err());
}

#[test]
fn test_env_blank_host_is_ignored() {
    let mut config = TestConfigBuilder::new().build();
    config
        .apply_overrides_from(lookup_from(&[("REMOTE_DB_HOST", "   ")]))
        .unwrap();
    assert_eq!(config.upstream.host, "db.internal");
}

#[test]
fn test_missing_host_fails_validation() {
    let mut config = Config::default();
    config
        .apply_overrides_from(lookup_from(&[("LOCAL_PORT", "6543")]))
        .unwrap();
    assert!(config.validate().is_err());
}
