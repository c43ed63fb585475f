//! 单向字节中继
//!
//! 从源连接持续读取并原样写入目标连接，直到源端结束或任一端出错。
//! 不做任何分帧或协议解析。

use crate::r#const::{direction_labels, termination_labels};
use bytes::BytesMut;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// 中继方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ClientToUpstream,
    UpstreamToClient,
}

impl Direction {
    /// 指标标签
    pub fn label(&self) -> &'static str {
        match self {
            Direction::ClientToUpstream => direction_labels::CLIENT_TO_UPSTREAM,
            Direction::UpstreamToClient => direction_labels::UPSTREAM_TO_CLIENT,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToUpstream => f.write_str("client->upstream"),
            Direction::UpstreamToClient => f.write_str("upstream->client"),
        }
    }
}

/// 单个方向中继的结束方式
#[derive(Debug)]
pub enum RelayEnd {
    /// 源端正常关闭写方向
    Eof,
    /// 从源端读取失败
    ReadFailed(io::Error),
    /// 向目标端写入失败
    WriteFailed(io::Error),
}

impl RelayEnd {
    /// 是否为正常结束
    pub fn is_clean(&self) -> bool {
        matches!(self, RelayEnd::Eof)
    }

    /// 指标标签
    pub fn label(&self) -> &'static str {
        match self {
            RelayEnd::Eof => termination_labels::PEER_CLOSED,
            RelayEnd::ReadFailed(_) => termination_labels::READ_ERROR,
            RelayEnd::WriteFailed(_) => termination_labels::WRITE_ERROR,
        }
    }
}

impl fmt::Display for RelayEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayEnd::Eof => f.write_str("peer closed"),
            RelayEnd::ReadFailed(e) => write!(f, "read error: {}", e),
            RelayEnd::WriteFailed(e) => write!(f, "write error: {}", e),
        }
    }
}

/// 会话级活动时钟，两个方向共享
///
/// 记录自会话开始以来最近一次传输字节的时间（毫秒）。
#[derive(Debug)]
pub struct Activity {
    started: Instant,
    last_ms: AtomicU64,
}

impl Activity {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            last_ms: AtomicU64::new(0),
        }
    }

    /// 记录一次活动
    #[inline]
    pub fn touch(&self) {
        let now = self.started.elapsed().as_millis() as u64;
        self.last_ms.fetch_max(now, Ordering::Relaxed);
    }

    /// 距离最近一次活动的时长
    pub fn idle_for(&self) -> Duration {
        let now = self.started.elapsed().as_millis() as u64;
        Duration::from_millis(now.saturating_sub(self.last_ms.load(Ordering::Relaxed)))
    }

    /// 会话已持续的时长
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}

/// 单个方向的字节计数
///
/// 计数保存在原子变量中，方向被强制终止后依然可读。
#[derive(Debug, Default)]
pub struct RelayMeter {
    bytes: AtomicU64,
}

impl RelayMeter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn record(&self, n: usize) {
        self.bytes.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// 已中继的字节数
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

/// 将 `source` 的字节原样复制到 `dest`
///
/// 源端结束时关闭目标端的写方向后返回 [`RelayEnd::Eof`]；
/// 读写错误分别返回 [`RelayEnd::ReadFailed`] 和 [`RelayEnd::WriteFailed`]。
pub async fn relay<R, W>(
    mut source: R,
    mut dest: W,
    buffer_size: usize,
    meter: &RelayMeter,
    activity: &Activity,
) -> RelayEnd
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(buffer_size);

    loop {
        buf.clear();
        match source.read_buf(&mut buf).await {
            Ok(0) => {
                // 向目标端传递 FIN，失败不影响结果
                let _ = dest.shutdown().await;
                return RelayEnd::Eof;
            }
            Ok(n) => {
                if let Err(e) = dest.write_all(&buf[..n]).await {
                    return RelayEnd::WriteFailed(e);
                }
                meter.record(n);
                activity.touch();
            }
            Err(e) => return RelayEnd::ReadFailed(e),
        }
    }
}
