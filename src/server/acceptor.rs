use crate::error::AppError;
use crate::metrics::METRICS;
use crate::r#const::{termination_labels, ACCEPT_BACKOFF_MS};
use crate::server::listener::create_tcp_listener;
use crate::server::session::Session;
use crate::server::ProxyContext;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_graceful_shutdown::{IntoSubsystem, SubsystemHandle};
use tracing::{debug, error, info, warn};

/// 接受连接错误的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptFailure {
    /// 单个连接的问题，立即继续接受
    Transient,
    /// 资源暂时耗尽，退避后继续
    Backoff,
    /// 监听器已不可用，结束接受循环
    Fatal,
}

/// 对接受连接时的错误进行分类
pub fn classify_accept_error(e: &io::Error) -> AcceptFailure {
    use io::ErrorKind::*;

    match e.kind() {
        ConnectionAborted | ConnectionReset | ConnectionRefused | Interrupted | WouldBlock
        | TimedOut => AcceptFailure::Transient,
        InvalidInput | NotConnected => AcceptFailure::Fatal,
        _ => AcceptFailure::Backoff,
    }
}

// 代理接收器
pub struct ProxyServer {
    // 监听器
    listener: TcpListener,
    // 实际监听地址
    addr: SocketAddr,
    // 共享上下文
    ctx: Arc<ProxyContext>,
    // 并发准入闸门
    admission: Option<Arc<Semaphore>>,
}

impl ProxyServer {
    /// 绑定监听地址
    ///
    /// 在启动任何子系统之前调用，绑定失败即为致命错误。
    pub fn bind(ctx: Arc<ProxyContext>, backlog: u32) -> Result<Self, AppError> {
        let listener = create_tcp_listener(ctx.target().listen_addr(), backlog as i32)?;
        let addr = listener.local_addr()?;
        let admission = ctx
            .options()
            .max_connections
            .map(|limit| Arc::new(Semaphore::new(limit)));

        Ok(Self {
            listener,
            addr,
            ctx,
            admission,
        })
    }

    // 获取服务器监听地址
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// 运行接受循环，直到 `shutdown` 完成或监听器出现不可恢复的错误
    ///
    /// 停止接受后在排空时间内等待进行中的会话结束，超时则强制关闭剩余会话。
    pub async fn serve<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()>,
    {
        let ProxyServer {
            listener,
            addr,
            ctx,
            admission,
        } = self;

        info!(
            "Proxy listening on {}, forwarding to upstream {}",
            addr,
            ctx.target().upstream_authority()
        );

        let mut sessions = JoinSet::new();
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping proxy acceptor");
                    break Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        dispatch(&mut sessions, stream, peer, &ctx, admission.as_ref());
                    }
                    Err(e) => {
                        METRICS.accept_errors_total().inc();
                        match classify_accept_error(&e) {
                            AcceptFailure::Transient => {
                                warn!("Failed to accept connection: {}", e);
                            }
                            AcceptFailure::Backoff => {
                                warn!(
                                    "Failed to accept connection, retrying in {}ms: {}",
                                    ACCEPT_BACKOFF_MS, e
                                );
                                tokio::time::sleep(Duration::from_millis(ACCEPT_BACKOFF_MS)).await;
                            }
                            AcceptFailure::Fatal => {
                                error!("Listener on {} failed: {}", addr, e);
                                break Err(AppError::Accept(e));
                            }
                        }
                    }
                },
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    reap(joined);
                }
            }
        };

        // 关闭监听器，不再接受新连接
        drop(listener);
        drain(sessions, ctx.options().drain_timeout).await;

        info!("Proxy acceptor on {} stopped", addr);
        result
    }
}

// 为新连接创建会话，不等待会话完成
fn dispatch(
    sessions: &mut JoinSet<()>,
    stream: TcpStream,
    peer: SocketAddr,
    ctx: &Arc<ProxyContext>,
    admission: Option<&Arc<Semaphore>>,
) {
    METRICS.connections_accepted_total().inc();

    let permit = match admission {
        Some(semaphore) => match semaphore.clone().try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                warn!(
                    "Rejecting connection from {}: concurrent session limit reached",
                    peer
                );
                METRICS.connections_rejected_total().inc();
                drop(stream);
                return;
            }
        },
        None => None,
    };

    let mut session = Session::new(stream, peer, ctx.clone());
    info!("Connection accepted from {} (session {})", peer, session.id());

    if let Some(permit) = permit {
        session = session.with_permit(permit);
    }

    // 会话内部已记录错误，这里只需驱动其完成
    sessions.spawn(async move {
        let _ = session.run().await;
    });
}

// 回收已结束的会话任务
fn reap(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("Session task panicked: {}", e);
        } else {
            debug!("Session task cancelled: {}", e);
        }
    }
}

// 等待进行中的会话排空，超时后强制关闭
async fn drain(mut sessions: JoinSet<()>, timeout: Duration) {
    if sessions.is_empty() {
        return;
    }

    info!(
        "Waiting up to {}s for {} active sessions to drain",
        timeout.as_secs(),
        sessions.len()
    );

    let drained = tokio::time::timeout(timeout, async {
        while let Some(joined) = sessions.join_next().await {
            reap(joined);
        }
    })
    .await;

    if drained.is_err() {
        let remaining = sessions.len();
        warn!(
            "Drain timeout reached, closing {} remaining sessions",
            remaining
        );
        METRICS
            .session_terminations_total()
            .with_label_values(&[termination_labels::SHUTDOWN])
            .inc_by(remaining as u64);
        sessions.shutdown().await;
    } else {
        info!("All sessions drained");
    }
}

#[async_trait::async_trait]
impl IntoSubsystem<AppError> for ProxyServer {
    async fn run(self, subsys: SubsystemHandle) -> Result<(), AppError> {
        self.serve(subsys.on_shutdown_requested()).await
    }
}
