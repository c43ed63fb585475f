use crate::config::defaults::{
    default_admin_address, default_admin_port, default_backlog, default_listen_address,
    default_listen_port,
};
use crate::r#const::listen_limits;
use serde::{Deserialize, Serialize};
use validator::Validate;

// 代理监听配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListenConfig {
    // 监听地址
    #[serde(default = "default_listen_address")]
    #[validate(length(min = 1, message = "Listen address cannot be empty"))]
    pub address: String,
    // 监听端口
    #[serde(default = "default_listen_port")]
    pub port: u16,
    // 监听队列长度
    #[serde(default = "default_backlog")]
    #[validate(range(min = listen_limits::MIN_BACKLOG, max = listen_limits::MAX_BACKLOG))]
    pub backlog: u32,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
            port: default_listen_port(),
            backlog: default_backlog(),
        }
    }
}

// 管理服务配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminConfig {
    // 是否启用管理服务
    #[serde(default)]
    pub enabled: bool,
    // 监听地址
    #[serde(default = "default_admin_address")]
    #[validate(length(min = 1, message = "Admin address cannot be empty"))]
    pub address: String,
    // 监听端口
    #[serde(default = "default_admin_port")]
    pub port: u16,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: default_admin_address(),
            port: default_admin_port(),
        }
    }
}
