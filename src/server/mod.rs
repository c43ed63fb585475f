// 导出子模块
pub mod acceptor;
pub mod listener;
pub mod relay;
pub mod session;

// 重新导出常用类型
pub use self::acceptor::{classify_accept_error, AcceptFailure, ProxyServer};
pub use self::listener::create_tcp_listener;
pub use self::relay::{relay, Activity, Direction, RelayEnd, RelayMeter};
pub use self::session::{Expiry, Session, SessionReport, SessionState, Termination};

use crate::config::session::optional_secs;
use crate::config::{Config, TargetConfig};
use crate::error::AppError;
use std::time::Duration;

/// 会话运行参数
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    // 上游连接超时
    pub connect_timeout: Duration,
    // 是否启用 TCP_NODELAY
    pub nodelay: bool,
    // 中继读取缓冲区大小
    pub buffer_size: usize,
    // 空闲超时
    pub idle_timeout: Option<Duration>,
    // 最大会话持续时间
    pub max_duration: Option<Duration>,
    // 最大并发会话数
    pub max_connections: Option<usize>,
    // 关闭时的排空时间
    pub drain_timeout: Duration,
}

impl SessionOptions {
    // 从配置构建会话参数
    pub fn from_config(config: &Config) -> Self {
        let session = &config.session;
        Self {
            connect_timeout: Duration::from_secs(config.upstream.connect_timeout),
            nodelay: config.upstream.nodelay,
            buffer_size: session.buffer_size,
            idle_timeout: optional_secs(session.idle_timeout),
            max_duration: optional_secs(session.max_duration),
            max_connections: (session.max_connections > 0)
                .then_some(session.max_connections as usize),
            drain_timeout: Duration::from_secs(session.drain_timeout),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 代理共享上下文
///
/// 启动时构建一次，由接收器和所有会话只读共享，无需加锁。
#[derive(Debug)]
pub struct ProxyContext {
    target: TargetConfig,
    options: SessionOptions,
}

impl ProxyContext {
    pub fn new(target: TargetConfig, options: SessionOptions) -> Self {
        Self { target, options }
    }

    // 从已验证的配置构建上下文
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(config.target()?, SessionOptions::from_config(config)))
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}
