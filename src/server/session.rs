//! 连接会话
//!
//! 一个会话拥有一个客户端连接以及代表该客户端建立的上游连接，
//! 负责拨号、启动两个方向的中继，以及两端套接字的统一关闭。

use crate::error::AppError;
use crate::metrics::METRICS;
use crate::r#const::termination_labels;
use crate::server::relay::{relay, Activity, Direction, RelayEnd, RelayMeter};
use crate::server::ProxyContext;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Dialing,
    Relaying,
    Closing,
    Closed,
}

/// 会话因超时被关闭的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    IdleTimeout,
    MaxDuration,
}

/// 单个中继方向的终止方式
#[derive(Debug)]
pub enum Termination {
    /// 中继自行结束
    Finished(RelayEnd),
    /// 另一方向先结束，本方向被强制关闭
    ClosedByCompanion,
    /// 会话超时，本方向被强制关闭
    Expired(Expiry),
    /// 中继任务异常退出
    Panicked,
}

impl Termination {
    /// 指标标签
    pub fn label(&self) -> &'static str {
        match self {
            Termination::Finished(end) => end.label(),
            Termination::ClosedByCompanion => termination_labels::PEER_CLOSED,
            Termination::Expired(Expiry::IdleTimeout) => termination_labels::IDLE_TIMEOUT,
            Termination::Expired(Expiry::MaxDuration) => termination_labels::MAX_DURATION,
            Termination::Panicked => termination_labels::PANICKED,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Finished(end) => fmt::Display::fmt(end, f),
            Termination::ClosedByCompanion => f.write_str("closed by companion"),
            Termination::Expired(Expiry::IdleTimeout) => f.write_str("idle timeout"),
            Termination::Expired(Expiry::MaxDuration) => f.write_str("max duration reached"),
            Termination::Panicked => f.write_str("relay task panicked"),
        }
    }
}

/// 会话结束报告
#[derive(Debug)]
pub struct SessionReport {
    pub id: Uuid,
    pub peer: SocketAddr,
    pub bytes_client_to_upstream: u64,
    pub bytes_upstream_to_client: u64,
    pub client_to_upstream: Termination,
    pub upstream_to_client: Termination,
    pub duration: Duration,
}

// 活跃会话计数守卫，会话被中止时同样会递减
struct ActiveSession;

impl ActiveSession {
    fn enter() -> Self {
        METRICS.active_sessions().inc();
        ActiveSession
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        METRICS.active_sessions().dec();
    }
}

/// 连接会话
pub struct Session {
    id: Uuid,
    peer: SocketAddr,
    client: Option<TcpStream>,
    ctx: Arc<ProxyContext>,
    state: SessionState,
    // 并发准入许可，会话关闭时释放
    _permit: Option<OwnedSemaphorePermit>,
}

impl Session {
    // 创建新的会话
    pub fn new(client: TcpStream, peer: SocketAddr, ctx: Arc<ProxyContext>) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            client: Some(client),
            ctx,
            state: SessionState::Dialing,
            _permit: None,
        }
    }

    // 附加并发准入许可
    pub fn with_permit(mut self, permit: OwnedSemaphorePermit) -> Self {
        self._permit = Some(permit);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {} state {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }

    /// 运行会话直到两端套接字均已关闭
    ///
    /// 上游拨号失败时只关闭客户端连接并返回错误，不影响其他会话。
    pub async fn run(mut self) -> Result<SessionReport, AppError> {
        let _active = ActiveSession::enter();

        let upstream = match self.dial().await {
            Ok(upstream) => upstream,
            Err(e) => {
                warn!("Session {} from {} failed to dial upstream: {}", self.id, self.peer, e);
                METRICS.upstream_dial_errors_total().inc();
                self.close();
                return Err(e);
            }
        };
        let client = self
            .client
            .take()
            .ok_or_else(|| AppError::Internal("session has no client connection".to_string()))?;
        self.transition(SessionState::Relaying);

        let report = self.relay_both(client, upstream).await;
        self.close();

        info!(
            "Session {} from {} closed: client->upstream {} bytes ({}), upstream->client {} bytes ({}), duration {}ms",
            report.id,
            report.peer,
            report.bytes_client_to_upstream,
            report.client_to_upstream,
            report.bytes_upstream_to_client,
            report.upstream_to_client,
            report.duration.as_millis()
        );

        Ok(report)
    }

    // 连接上游目标
    async fn dial(&self) -> Result<TcpStream, AppError> {
        let target = self.ctx.target().upstream_authority();
        let timeout = self.ctx.options().connect_timeout;
        let start_time = Instant::now();

        debug!("Session {} dialing upstream {}", self.id, target);

        let upstream = match tokio::time::timeout(timeout, TcpStream::connect(target.as_str())).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(AppError::Dial { target, source }),
            Err(_) => return Err(AppError::DialTimeout { target, timeout }),
        };

        METRICS
            .upstream_dial_duration_seconds()
            .observe(start_time.elapsed().as_secs_f64());

        if self.ctx.options().nodelay {
            for stream in self.client.iter().chain(std::iter::once(&upstream)) {
                if let Err(e) = stream.set_nodelay(true) {
                    debug!("Session {} failed to set TCP_NODELAY: {}", self.id, e);
                }
            }
        }

        Ok(upstream)
    }

    // 同时运行两个方向的中继，任一方向结束后关闭两端并等待另一方向退出
    async fn relay_both(&mut self, client: TcpStream, upstream: TcpStream) -> SessionReport {
        let options = *self.ctx.options();
        let buffer_size = options.buffer_size;
        let activity = Arc::new(Activity::new());
        let c2u_meter = Arc::new(RelayMeter::new());
        let u2c_meter = Arc::new(RelayMeter::new());

        let (client_read, client_write) = client.into_split();
        let (upstream_read, upstream_write) = upstream.into_split();

        // JoinSet 被丢弃时会中止其中的任务，中继任务不会比会话活得更久
        let mut relays = JoinSet::new();
        let mut outcome = Outcome::new(self.id);
        {
            let meter = c2u_meter.clone();
            let activity = activity.clone();
            let handle = relays.spawn(async move {
                relay(client_read, upstream_write, buffer_size, &meter, &activity).await
            });
            outcome.track(handle.id(), Direction::ClientToUpstream);
        }
        {
            let meter = u2c_meter.clone();
            let activity = activity.clone();
            let handle = relays.spawn(async move {
                relay(upstream_read, client_write, buffer_size, &meter, &activity).await
            });
            outcome.track(handle.id(), Direction::UpstreamToClient);
        }

        let cause = tokio::select! {
            Some(joined) = relays.join_next_with_id() => outcome.record(joined),
            expiry = wait_for_expiry(options.idle_timeout, options.max_duration, &activity) => {
                debug!("Session {} expired: {:?}", self.id, expiry);
                outcome.expire(expiry)
            }
        };

        // 中止仍在运行的方向，其持有的半连接随之释放
        self.transition(SessionState::Closing);
        relays.abort_all();
        while let Some(joined) = relays.join_next_with_id().await {
            outcome.record(joined);
        }

        let bytes_client_to_upstream = c2u_meter.bytes();
        let bytes_upstream_to_client = u2c_meter.bytes();

        METRICS
            .relay_bytes_total()
            .with_label_values(&[Direction::ClientToUpstream.label()])
            .inc_by(bytes_client_to_upstream);
        METRICS
            .relay_bytes_total()
            .with_label_values(&[Direction::UpstreamToClient.label()])
            .inc_by(bytes_upstream_to_client);
        METRICS
            .session_terminations_total()
            .with_label_values(&[cause])
            .inc();
        METRICS
            .session_duration_seconds()
            .observe(activity.elapsed().as_secs_f64());

        SessionReport {
            id: self.id,
            peer: self.peer,
            bytes_client_to_upstream,
            bytes_upstream_to_client,
            client_to_upstream: outcome.client_to_upstream,
            upstream_to_client: outcome.upstream_to_client,
            duration: activity.elapsed(),
        }
    }

    // 释放客户端套接字，上游套接字在中继结束时已随任务释放
    fn close(&mut self) {
        self.client.take();
        self.transition(SessionState::Closed);
    }
}

// 两个方向的终止结果
struct Outcome {
    id: Uuid,
    // 中继任务与其方向的对应关系
    tasks: Vec<(task::Id, Direction)>,
    client_to_upstream: Termination,
    upstream_to_client: Termination,
}

impl Outcome {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            tasks: Vec::with_capacity(2),
            client_to_upstream: Termination::ClosedByCompanion,
            upstream_to_client: Termination::ClosedByCompanion,
        }
    }

    // 登记一个中继任务
    fn track(&mut self, id: task::Id, direction: Direction) {
        self.tasks.push((id, direction));
    }

    fn direction_of(&self, id: task::Id) -> Option<Direction> {
        self.tasks
            .iter()
            .find(|(task_id, _)| *task_id == id)
            .map(|(_, direction)| *direction)
    }

    fn set(&mut self, direction: Direction, termination: Termination) {
        match direction {
            Direction::ClientToUpstream => self.client_to_upstream = termination,
            Direction::UpstreamToClient => self.upstream_to_client = termination,
        }
    }

    // 记录一个方向的结束，返回其指标标签
    fn record(&mut self, joined: Result<(task::Id, RelayEnd), JoinError>) -> &'static str {
        match joined {
            Ok((id, end)) => {
                let label = end.label();
                match self.direction_of(id) {
                    Some(direction) => {
                        match &end {
                            RelayEnd::Eof => {
                                debug!("Session {} {} reached end of stream", self.id, direction)
                            }
                            other => warn!("Session {} {} terminated: {}", self.id, direction, other),
                        }
                        self.set(direction, Termination::Finished(end));
                    }
                    None => warn!("Session {} finished an untracked relay task: {}", self.id, end),
                }
                label
            }
            Err(e) if e.is_panic() => {
                error!("Session {} relay task panicked: {}", self.id, e);
                if let Some(direction) = self.direction_of(e.id()) {
                    self.set(direction, Termination::Panicked);
                }
                termination_labels::PANICKED
            }
            // 被中止的方向保留默认的终止原因
            Err(_) => termination_labels::PEER_CLOSED,
        }
    }

    // 记录会话超时
    fn expire(&mut self, expiry: Expiry) -> &'static str {
        self.client_to_upstream = Termination::Expired(expiry);
        self.upstream_to_client = Termination::Expired(expiry);
        self.client_to_upstream.label()
    }
}

// 等待空闲超时或最大持续时间到达，两者均禁用时永不返回
async fn wait_for_expiry(
    idle_timeout: Option<Duration>,
    max_duration: Option<Duration>,
    activity: &Activity,
) -> Expiry {
    if idle_timeout.is_none() && max_duration.is_none() {
        return std::future::pending().await;
    }

    loop {
        let elapsed = activity.elapsed();
        let idle_for = activity.idle_for();

        let mut wait = Duration::MAX;
        if let Some(max) = max_duration {
            if elapsed >= max {
                return Expiry::MaxDuration;
            }
            wait = wait.min(max - elapsed);
        }
        if let Some(idle) = idle_timeout {
            if idle_for >= idle {
                return Expiry::IdleTimeout;
            }
            wait = wait.min(idle - idle_for);
        }

        tokio::time::sleep(wait).await;
    }
}
