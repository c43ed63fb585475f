use dbproxy::{
    admin::AdminServer,
    args::Args,
    config::{env::load_dotenv, Config},
    error::AppError,
    server::{ProxyContext, ProxyServer},
};
use mimalloc::MiMalloc;
use std::{process, sync::Arc};
use tokio_graceful_shutdown::{IntoSubsystem, SubsystemBuilder, Toplevel};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// 使用 mimalloc 分配器提高内存效率
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn init_logging(args: &Args) {
    // RUST_LOG 优先，否则根据调试模式选择级别
    let default_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_line_number(false)
        .with_env_filter(filter)
        .init();
}

// 程序入口
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 解析命令行参数
    let args = Args::parse_args();

    // 初始化日志
    init_logging(&args);

    // 验证参数
    if let Err(e) = args.validation() {
        error!("Invalid command line arguments: {}", e);
        process::exit(1);
    }

    info!("Starting DBProxy - TCP forwarding proxy");

    // 加载 dotenv 文件
    if let Err(e) = load_dotenv(args.env_file.as_deref()) {
        error!("{}", e);
        process::exit(1);
    }

    // 加载配置
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => {
            info!("Successfully loaded configuration");
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = args.validate_drain_timeout(config.session.drain_timeout) {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    // 如果是测试模式，成功验证配置后退出
    if args.test_config {
        info!("Configuration validated successfully");
        return Ok(());
    }

    // 创建应用组件，监听地址绑定失败即退出
    let components = match create_components(&config) {
        Ok(components) => components,
        Err(e) => {
            error!("Failed to create application components: {}", e);
            process::exit(1);
        }
    };

    // 创建优雅关闭顶层管理器
    let toplevel = Toplevel::new(|s| async move {
        // 启动代理接收器子系统
        let proxy_server = components.proxy_server;
        s.start(SubsystemBuilder::new("proxy_server", move |s| async move {
            proxy_server.run(s).await
        }));

        // 启动管理服务子系统
        if let Some(admin_server) = components.admin_server {
            s.start(SubsystemBuilder::new("admin_server", move |s| async move {
                admin_server.run(s).await
            }));
        }
    });

    // 等待关闭
    info!("All services started, waiting for connections...");
    match toplevel
        .catch_signals()
        .handle_shutdown_requests(tokio::time::Duration::from_secs(args.shutdown_timeout))
        .await
    {
        Ok(_) => {
            info!("Application gracefully shutdown");
            Ok(())
        }
        Err(e) => {
            error!("Application shutdown error: {}", e);
            process::exit(1);
        }
    }
}

// 应用组件
struct AppComponents {
    // 代理接收器
    proxy_server: ProxyServer,
    // 管理服务
    admin_server: Option<AdminServer>,
}

// 创建应用组件
fn create_components(config: &Config) -> Result<AppComponents, AppError> {
    // 目标配置只构建一次，之后只读共享
    let ctx = Arc::new(ProxyContext::from_config(config)?);
    info!("Proxy target: {}", ctx.target());

    let proxy_server = ProxyServer::bind(ctx.clone(), config.listen.backlog)?;
    info!(
        "Proxy listener bound successfully: {}",
        proxy_server.local_addr()
    );

    // 创建管理服务
    let admin_server = if config.admin.enabled {
        let admin_addr = config.admin_addr()?;
        info!("Admin server initialized successfully: {}", admin_addr);
        Some(AdminServer::new(admin_addr, ctx, proxy_server.local_addr()))
    } else {
        None
    };

    Ok(AppComponents {
        proxy_server,
        admin_server,
    })
}
