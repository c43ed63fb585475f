use crate::error::AppError;
use std::net::{IpAddr, SocketAddr};
use tracing::debug;
use validator::Validate;

use super::Config;

impl Config {
    // 验证配置
    pub fn validate(&self) -> Result<(), AppError> {
        // 字段范围验证
        self.listen.validate()?;
        self.upstream.validate()?;
        self.session.validate()?;
        self.admin.validate()?;

        // 验证监听地址
        let listen_addr = self.listen_addr()?;

        // 验证上游主机
        if self.upstream.host.chars().any(char::is_whitespace) {
            return Err(AppError::Config(format!(
                "Upstream host '{}' must not contain whitespace",
                self.upstream.host
            )));
        }

        // 验证管理服务地址不与代理监听冲突
        if self.admin.enabled {
            let admin_addr = self.admin_addr()?;
            if addresses_overlap(&listen_addr, &admin_addr) {
                return Err(AppError::Config(format!(
                    "Admin service address {} conflicts with proxy listener {}",
                    admin_addr, listen_addr
                )));
            }
        }

        debug!("Configuration validated: {}", self.target()?);

        Ok(())
    }

    /// 代理监听地址
    pub fn listen_addr(&self) -> Result<SocketAddr, AppError> {
        parse_socket_addr("listen", &self.listen.address, self.listen.port)
    }

    /// 管理服务监听地址
    pub fn admin_addr(&self) -> Result<SocketAddr, AppError> {
        parse_socket_addr("admin", &self.admin.address, self.admin.port)
    }
}

// 解析 IP 地址与端口
fn parse_socket_addr(section: &str, address: &str, port: u16) -> Result<SocketAddr, AppError> {
    let ip = address.trim().parse::<IpAddr>().map_err(|e| {
        AppError::Config(format!(
            "Invalid {} address '{}': {}",
            section, address, e
        ))
    })?;
    Ok(SocketAddr::new(ip, port))
}

// 两个监听地址是否会争用同一个端口，端口 0 由系统分配不会冲突
fn addresses_overlap(a: &SocketAddr, b: &SocketAddr) -> bool {
    if a.port() == 0 || a.port() != b.port() {
        return false;
    }
    a.ip() == b.ip() || a.ip().is_unspecified() || b.ip().is_unspecified()
}
