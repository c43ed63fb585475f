use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// 代理目标配置
///
/// 进程启动时构建一次，之后只读。所有会话共享同一个实例，
/// 字段私有且不提供修改方法。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    listen: SocketAddr,
    upstream_host: String,
    upstream_port: u16,
}

impl TargetConfig {
    pub fn new(listen: SocketAddr, upstream_host: impl Into<String>, upstream_port: u16) -> Self {
        Self {
            listen,
            upstream_host: upstream_host.into(),
            upstream_port,
        }
    }

    /// 本地监听地址
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen
    }

    /// 上游主机
    pub fn upstream_host(&self) -> &str {
        &self.upstream_host
    }

    /// 上游端口
    pub fn upstream_port(&self) -> u16 {
        self.upstream_port
    }

    /// 上游地址，格式为 host:port，IPv6 字面量会加上方括号
    pub fn upstream_authority(&self) -> String {
        match self.upstream_host.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{}]:{}", ip, self.upstream_port),
            _ => format!("{}:{}", self.upstream_host, self.upstream_port),
        }
    }
}

impl fmt::Display for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.listen, self.upstream_authority())
    }
}
