use crate::error::AppError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// 创建 TCP 监听器
/// 根据提供的地址和监听队列大小创建一个非阻塞的 TCP 监听器。
/// 任一步骤失败都视为绑定失败。
pub fn create_tcp_listener(addr: SocketAddr, backlog: i32) -> Result<TcpListener, AppError> {
    let bind_error = |source| AppError::Bind { addr, source };

    // 根据地址类型确定域
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    // 创建 socket
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(bind_error)?;

    // 设置 SO_REUSEADDR 选项 (所有平台)
    socket.set_reuse_address(true).map_err(bind_error)?;

    // 绑定到地址
    socket.bind(&addr.into()).map_err(bind_error)?;

    // 开始监听
    socket.listen(backlog).map_err(bind_error)?;

    // 设置为非阻塞模式
    socket.set_nonblocking(true).map_err(bind_error)?;

    // 将 socket2::Socket 转换为 std::net::TcpListener
    let std_listener: std::net::TcpListener = socket.into();

    // 将 std::net::TcpListener 转换为 tokio::net::TcpListener
    TcpListener::from_std(std_listener).map_err(bind_error)
}
