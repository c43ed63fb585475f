use crate::config::defaults::{default_connect_timeout, default_nodelay, default_upstream_port};
use crate::r#const::upstream_limits;
use serde::{Deserialize, Serialize};
use validator::Validate;

// 上游数据库配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpstreamConfig {
    // 上游主机名或 IP
    #[serde(default)]
    #[validate(length(min = 1, message = "Upstream host is required"))]
    pub host: String,
    // 上游端口
    #[serde(default = "default_upstream_port")]
    #[validate(range(min = 1, message = "Upstream port cannot be 0"))]
    pub port: u16,
    // 连接超时（秒）
    #[serde(default = "default_connect_timeout")]
    #[validate(range(
        min = upstream_limits::MIN_CONNECT_TIMEOUT,
        max = upstream_limits::MAX_CONNECT_TIMEOUT
    ))]
    pub connect_timeout: u64,
    // 是否在两端套接字上启用 TCP_NODELAY
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_upstream_port(),
            connect_timeout: default_connect_timeout(),
            nodelay: default_nodelay(),
        }
    }
}
