use once_cell::sync::Lazy;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

/// 应用指标
pub struct Metrics {
    registry: Registry,
    // 已接受连接计数
    connections_accepted_total: IntCounter,
    // 因并发上限被拒绝的连接计数
    connections_rejected_total: IntCounter,
    // 接受连接错误计数
    accept_errors_total: IntCounter,
    // 活跃会话数
    active_sessions: IntGauge,
    // 上游连接失败计数
    upstream_dial_errors_total: IntCounter,
    // 上游连接耗时
    upstream_dial_duration_seconds: Histogram,
    // 中继字节计数
    relay_bytes_total: IntCounterVec,
    // 会话终止计数
    session_terminations_total: IntCounterVec,
    // 会话持续时间
    session_duration_seconds: Histogram,
}

impl Metrics {
    /// 创建新的指标收集器
    fn new() -> Self {
        let registry = Registry::new();

        // 已接受连接计数
        let connections_accepted_total = IntCounter::with_opts(Opts::new(
            "dbproxy_connections_accepted_total",
            "Total number of inbound client connections accepted by the proxy.",
        ))
        .unwrap();

        // 被拒绝连接计数
        let connections_rejected_total = IntCounter::with_opts(Opts::new(
            "dbproxy_connections_rejected_total",
            "Total number of client connections closed because the concurrent session limit was reached.",
        ))
        .unwrap();

        // 接受连接错误计数
        let accept_errors_total = IntCounter::with_opts(Opts::new(
            "dbproxy_accept_errors_total",
            "Total number of errors returned by the listener while accepting connections.",
        ))
        .unwrap();

        // 活跃会话数
        let active_sessions = IntGauge::with_opts(Opts::new(
            "dbproxy_active_sessions",
            "Number of client sessions currently dialing or relaying.",
        ))
        .unwrap();

        // 上游连接失败计数
        let upstream_dial_errors_total = IntCounter::with_opts(Opts::new(
            "dbproxy_upstream_dial_errors_total",
            "Total number of failed or timed out connection attempts to the upstream server.",
        ))
        .unwrap();

        // 上游连接耗时
        let upstream_dial_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "dbproxy_upstream_dial_duration_seconds",
            "The latency of successful connection attempts to the upstream server, in seconds.",
        ))
        .unwrap();

        // 中继字节计数
        let relay_bytes_total = IntCounterVec::new(
            Opts::new(
                "dbproxy_relay_bytes_total",
                "Total number of bytes relayed, by direction.",
            ),
            &["direction"],
        )
        .unwrap();

        // 会话终止计数
        let session_terminations_total = IntCounterVec::new(
            Opts::new(
                "dbproxy_session_terminations_total",
                "Total number of sessions torn down, by the reason that triggered teardown.",
            ),
            &["reason"],
        )
        .unwrap();

        // 会话持续时间
        let session_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "dbproxy_session_duration_seconds",
                "The lifetime of relaying sessions, from successful dial until both sockets are closed, in seconds.",
            )
            .buckets(vec![
                0.01, 0.1, 1.0, 10.0, 60.0, 300.0, 1800.0, 3600.0, 14400.0, 86400.0,
            ]),
        )
        .unwrap();

        // 注册指标
        registry
            .register(Box::new(connections_accepted_total.clone()))
            .unwrap();
        registry
            .register(Box::new(connections_rejected_total.clone()))
            .unwrap();
        registry
            .register(Box::new(accept_errors_total.clone()))
            .unwrap();
        registry.register(Box::new(active_sessions.clone())).unwrap();
        registry
            .register(Box::new(upstream_dial_errors_total.clone()))
            .unwrap();
        registry
            .register(Box::new(upstream_dial_duration_seconds.clone()))
            .unwrap();
        registry
            .register(Box::new(relay_bytes_total.clone()))
            .unwrap();
        registry
            .register(Box::new(session_terminations_total.clone()))
            .unwrap();
        registry
            .register(Box::new(session_duration_seconds.clone()))
            .unwrap();

        Self {
            registry,
            connections_accepted_total,
            connections_rejected_total,
            accept_errors_total,
            active_sessions,
            upstream_dial_errors_total,
            upstream_dial_duration_seconds,
            relay_bytes_total,
            session_terminations_total,
            session_duration_seconds,
        }
    }

    /// 获取注册表
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// 已接受连接计数
    pub fn connections_accepted_total(&self) -> &IntCounter {
        &self.connections_accepted_total
    }

    /// 被拒绝连接计数
    pub fn connections_rejected_total(&self) -> &IntCounter {
        &self.connections_rejected_total
    }

    /// 接受连接错误计数
    pub fn accept_errors_total(&self) -> &IntCounter {
        &self.accept_errors_total
    }

    /// 活跃会话数
    pub fn active_sessions(&self) -> &IntGauge {
        &self.active_sessions
    }

    /// 上游连接失败计数
    pub fn upstream_dial_errors_total(&self) -> &IntCounter {
        &self.upstream_dial_errors_total
    }

    /// 上游连接耗时
    pub fn upstream_dial_duration_seconds(&self) -> &Histogram {
        &self.upstream_dial_duration_seconds
    }

    /// 中继字节计数
    pub fn relay_bytes_total(&self) -> &IntCounterVec {
        &self.relay_bytes_total
    }

    /// 会话终止计数
    pub fn session_terminations_total(&self) -> &IntCounterVec {
        &self.session_terminations_total
    }

    /// 会话持续时间
    pub fn session_duration_seconds(&self) -> &Histogram {
        &self.session_duration_seconds
    }
}

/// 全局指标实例
pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);
