// 应用常量定义

//
// 配置参数限制常量
//

// 应用关闭等待时间限制
pub mod shutdown_timeout {
    // 默认值
    pub const DEFAULT: u64 = 30;
    // 最小值
    pub const MIN: u64 = 1;
    // 最大值
    pub const MAX: u64 = 120;
}

// 监听配置限制
pub mod listen_limits {
    // 默认监听端口
    pub const DEFAULT_PORT: u16 = 5433;
    // 默认监听队列长度
    pub const DEFAULT_BACKLOG: u32 = 1024;
    // 最小监听队列长度
    pub const MIN_BACKLOG: u32 = 1;
    // 最大监听队列长度
    pub const MAX_BACKLOG: u32 = 65535;
}

// 上游连接限制
pub mod upstream_limits {
    // 默认上游端口
    pub const DEFAULT_PORT: u16 = 5432;
    // 默认连接超时（秒）
    pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;
    // 最小连接超时（秒）
    pub const MIN_CONNECT_TIMEOUT: u64 = 1;
    // 最大连接超时（秒）
    pub const MAX_CONNECT_TIMEOUT: u64 = 120;
}

// 会话配置限制
pub mod session_limits {
    // 默认中继缓冲区大小（字节）
    pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;
    // 最小中继缓冲区大小（字节）
    pub const MIN_BUFFER_SIZE: usize = 1024;
    // 最大中继缓冲区大小（字节）
    pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;
    // 最大空闲超时（秒），0 表示禁用
    pub const MAX_IDLE_TIMEOUT: u64 = 86400;
    // 最大会话持续时间（秒），0 表示禁用
    pub const MAX_DURATION: u64 = 7 * 86400;
    // 最大并发连接数，0 表示不限制
    pub const MAX_CONNECTIONS: u32 = 1_000_000;
    // 默认排空超时（秒）
    pub const DEFAULT_DRAIN_TIMEOUT: u64 = 10;
    // 最大排空超时（秒）
    pub const MAX_DRAIN_TIMEOUT: u64 = 110;
}

// 接受连接失败后的退避时间（毫秒）
pub const ACCEPT_BACKOFF_MS: u64 = 100;

// 环境变量名称
pub mod env_vars {
    // 本地监听端口
    pub const LOCAL_PORT: &str = "LOCAL_PORT";
    // 上游数据库主机
    pub const REMOTE_DB_HOST: &str = "REMOTE_DB_HOST";
    // 上游数据库端口
    pub const REMOTE_DB_PORT: &str = "REMOTE_DB_PORT";
}

//
// 指标标签常量
//

// 中继方向标签
pub mod direction_labels {
    // 客户端到上游
    pub const CLIENT_TO_UPSTREAM: &str = "client_to_upstream";
    // 上游到客户端
    pub const UPSTREAM_TO_CLIENT: &str = "upstream_to_client";
}

// 会话终止原因标签
pub mod termination_labels {
    // 对端正常关闭
    pub const PEER_CLOSED: &str = "peer_closed";
    // 读取错误
    pub const READ_ERROR: &str = "read_error";
    // 写入错误
    pub const WRITE_ERROR: &str = "write_error";
    // 空闲超时
    pub const IDLE_TIMEOUT: &str = "idle_timeout";
    // 超过最大持续时间
    pub const MAX_DURATION: &str = "max_duration";
    // 关闭时强制终止
    pub const SHUTDOWN: &str = "shutdown";
    // 任务异常
    pub const PANICKED: &str = "panicked";
}
