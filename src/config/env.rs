use crate::config::Config;
use crate::error::AppError;
use crate::r#const::env_vars;
use std::path::Path;
use tracing::{debug, info};

/// 加载 dotenv 文件
///
/// 显式指定的文件必须存在；未指定时尝试加载当前目录下的 `.env`，不存在则忽略。
pub fn load_dotenv(path: Option<&Path>) -> Result<(), AppError> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| {
                AppError::Config(format!("Unable to load env file {:?}: {}", path, e))
            })?;
            info!("Loaded environment from {:?}", path);
        }
        None => match dotenvy::dotenv() {
            Ok(path) => info!("Loaded environment from {:?}", path),
            Err(e) if e.not_found() => debug!("No .env file found, using process environment"),
            Err(e) => return Err(AppError::Config(format!("Unable to load .env file: {}", e))),
        },
    }
    Ok(())
}

impl Config {
    /// 使用进程环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) -> Result<(), AppError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// 使用给定的查找函数覆盖配置
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(env_vars::LOCAL_PORT) {
            self.listen.port = parse_port(env_vars::LOCAL_PORT, &port)?;
            debug!("Listen port overridden by {}: {}", env_vars::LOCAL_PORT, port);
        }

        if let Some(host) = lookup(env_vars::REMOTE_DB_HOST) {
            let host = host.trim();
            if !host.is_empty() {
                self.upstream.host = host.to_string();
                debug!("Upstream host overridden by {}: {}", env_vars::REMOTE_DB_HOST, host);
            }
        }

        if let Some(port) = lookup(env_vars::REMOTE_DB_PORT) {
            self.upstream.port = parse_port(env_vars::REMOTE_DB_PORT, &port)?;
            debug!("Upstream port overridden by {}: {}", env_vars::REMOTE_DB_PORT, port);
        }

        Ok(())
    }
}

// 解析端口号
fn parse_port(key: &str, value: &str) -> Result<u16, AppError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|e| AppError::Config(format!("Invalid port '{}' in {}: {}", value, key, e)))
}
