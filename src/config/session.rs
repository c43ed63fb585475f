use crate::config::defaults::{default_buffer_size, default_drain_timeout};
use crate::r#const::session_limits;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    // 中继读取缓冲区大小（字节）
    #[serde(default = "default_buffer_size")]
    #[validate(range(
        min = session_limits::MIN_BUFFER_SIZE,
        max = session_limits::MAX_BUFFER_SIZE
    ))]
    pub buffer_size: usize,
    // 空闲超时（秒），0 表示禁用
    #[serde(default)]
    #[validate(range(max = session_limits::MAX_IDLE_TIMEOUT))]
    pub idle_timeout: u64,
    // 最大会话持续时间（秒），0 表示禁用
    #[serde(default)]
    #[validate(range(max = session_limits::MAX_DURATION))]
    pub max_duration: u64,
    // 最大并发连接数，0 表示不限制
    #[serde(default)]
    #[validate(range(max = session_limits::MAX_CONNECTIONS))]
    pub max_connections: u32,
    // 关闭时等待会话排空的时间（秒）
    #[serde(default = "default_drain_timeout")]
    #[validate(range(max = session_limits::MAX_DRAIN_TIMEOUT))]
    pub drain_timeout: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            idle_timeout: 0,
            max_duration: 0,
            max_connections: 0,
            drain_timeout: default_drain_timeout(),
        }
    }
}

// 将以秒为单位、0 表示禁用的配置值转换为可选时长
#[inline]
pub(crate) fn optional_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
