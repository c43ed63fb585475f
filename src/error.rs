use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// 应用错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 监听地址绑定失败
    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// 上游连接失败
    #[error("Failed to connect to upstream {target}: {source}")]
    Dial {
        target: String,
        #[source]
        source: io::Error,
    },

    /// 上游连接超时
    #[error("Timed out connecting to upstream {target} after {timeout:?}")]
    DialTimeout { target: String, timeout: Duration },

    /// 监听器不可恢复的接受错误
    #[error("Listener failed to accept connections: {0}")]
    Accept(io::Error),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Config(errors.to_string())
    }
}
