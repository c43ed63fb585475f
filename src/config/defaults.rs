use crate::r#const::{listen_limits, session_limits, upstream_limits};

// 默认值函数
pub fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

pub fn default_listen_port() -> u16 {
    listen_limits::DEFAULT_PORT
}

pub fn default_backlog() -> u32 {
    listen_limits::DEFAULT_BACKLOG
}

pub fn default_upstream_port() -> u16 {
    upstream_limits::DEFAULT_PORT
}

pub fn default_connect_timeout() -> u64 {
    upstream_limits::DEFAULT_CONNECT_TIMEOUT
}

pub fn default_nodelay() -> bool {
    true
}

pub fn default_buffer_size() -> usize {
    session_limits::DEFAULT_BUFFER_SIZE
}

pub fn default_drain_timeout() -> u64 {
    session_limits::DEFAULT_DRAIN_TIMEOUT
}

pub fn default_admin_address() -> String {
    "127.0.0.1".to_string()
}

pub fn default_admin_port() -> u16 {
    9000
}
