use crate::r#const::shutdown_timeout;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

// DBProxy - 数据库 TCP 转发代理
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dbproxyd",
    author,
    version,
    about = "A transparent TCP forwarding proxy that relays every client connection byte-for-byte to a fixed upstream database server.\n\n\
             Key Features:\n\
             - Transparent Relay: No protocol parsing, bytes are forwarded unmodified in both directions.\n\
             - Connection Isolation: Upstream dial failures and relay errors only close the affected client.\n\
             - Coordinated Teardown: Both sockets of a session are closed together when either side ends.\n\
             - Session Controls: Optional idle timeout, maximum session duration and concurrent session limit.\n\
             - Easy Configuration: YAML file, .env file or LOCAL_PORT / REMOTE_DB_HOST / REMOTE_DB_PORT environment variables."
)]
pub struct Args {
    // 配置文件路径
    #[clap(
        short,
        long,
        value_name = "FILE",
        help = "Path to the YAML configuration file (optional, environment variables are applied on top)"
    )]
    pub config: Option<PathBuf>,

    // dotenv 文件路径
    #[clap(
        long = "env-file",
        value_name = "FILE",
        help = "Path to a dotenv file, defaults to .env in the working directory when present"
    )]
    pub env_file: Option<PathBuf>,

    // 是否开启调试模式
    #[clap(
        short,
        long,
        action = ArgAction::SetTrue,
        help = "Enable debug mode"
    )]
    pub debug: bool,

    // 是否仅测试配置文件
    #[clap(
        short = 't',
        long = "test",
        action = ArgAction::SetTrue,
        help = "Test configuration for validity and exit"
    )]
    pub test_config: bool,

    // 优雅关闭超时时间（秒）
    #[clap(
        long = "shutdown-timeout",
        value_name = "SECONDS",
        default_value_t = shutdown_timeout::DEFAULT,
        help = "Maximum time in seconds to wait for complete shutdown"
    )]
    pub shutdown_timeout: u64,
}

impl Args {
    // 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    // 验证参数
    pub fn validation(&self) -> Result<(), String> {
        // 验证关闭超时时间
        if self.shutdown_timeout < shutdown_timeout::MIN
            || self.shutdown_timeout > shutdown_timeout::MAX
        {
            return Err(format!(
                "Shutdown timeout must be between {} and {} seconds",
                shutdown_timeout::MIN,
                shutdown_timeout::MAX
            ));
        }

        Ok(())
    }

    // 验证关闭超时时间大于会话排空时间
    pub fn validate_drain_timeout(&self, drain_timeout: u64) -> Result<(), String> {
        if drain_timeout >= self.shutdown_timeout {
            return Err(format!(
                "Session drain timeout ({}s) must be shorter than the shutdown timeout ({}s)",
                drain_timeout, self.shutdown_timeout
            ));
        }
        Ok(())
    }
}
