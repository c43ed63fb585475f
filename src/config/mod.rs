// 导出子模块
pub mod defaults;
pub mod env;
pub mod listen;
pub mod session;
pub mod target;
pub mod upstream;
pub mod validation;

// 重新导出常用类型
pub use self::listen::{AdminConfig, ListenConfig};
pub use self::session::SessionConfig;
pub use self::target::TargetConfig;
pub use self::upstream::UpstreamConfig;

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

// 配置文件结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    // 代理监听配置
    #[serde(default)]
    pub listen: ListenConfig,
    // 上游数据库配置
    #[serde(default)]
    pub upstream: UpstreamConfig,
    // 会话配置
    #[serde(default)]
    pub session: SessionConfig,
    // 管理服务配置
    #[serde(default)]
    pub admin: AdminConfig,
}

impl Config {
    // 从文件加载并验证配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let config = Self::read_file(path)?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    // 加载配置：文件（可选）、环境变量覆盖，最后验证
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                debug!("No configuration file given, starting from defaults");
                Self::default()
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    // 构建不可变的目标配置
    pub fn target(&self) -> Result<TargetConfig, AppError> {
        Ok(TargetConfig::new(
            self.listen_addr()?,
            self.upstream.host.clone(),
            self.upstream.port,
        ))
    }

    // 读取并解析配置文件，不做验证
    fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        debug!("Attempting to load configuration from file: {:?}", path);

        // 打开并读取文件
        let mut file = File::open(path).map_err(|e| {
            AppError::Config(format!(
                "Unable to open configuration file {:?}: {}",
                path, e
            ))
        })?;

        let mut content = String::new();
        file.read_to_string(&mut content).map_err(|e| {
            AppError::Config(format!(
                "Unable to read configuration file {:?}: {}",
                path, e
            ))
        })?;

        // 解析YAML
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Configuration file parsing error: {}", e)))
    }
}
