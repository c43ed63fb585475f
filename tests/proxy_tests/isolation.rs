// tests/proxy_tests/isolation.rs

// 故障隔离测试：单个连接的失败不影响接收器和其他会话

use super::helpers::{
    assert_closed_within, start_backend, start_echo_backend, start_proxy, unused_addr,
    CLOSE_WINDOW,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// 上游不可达时只关闭受影响的客户端，随后上游恢复，新连接正常工作
#[tokio::test]
async fn test_dial_failure_closes_only_client() {
    let upstream = unused_addr();
    let proxy = start_proxy(upstream).await;

    // 上游端口没有监听，客户端连接被关闭且收不到任何数据
    let mut client = proxy.connect().await;
    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(CLOSE_WINDOW, client.read(&mut buf))
        .await
        .expect("client connection was not closed after dial failure");
    assert!(matches!(read, Ok(0) | Err(_)));

    // 上游恢复后，同一个代理继续接受并转发新连接
    let listener = TcpListener::bind(upstream).await.unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        stream.write_all(b"PONG").await.unwrap();
        let _ = stream.read(&mut buf).await;
    });

    let mut client = proxy.connect().await;
    client.write_all(b"PING").await.unwrap();
    let mut reply = [0u8; 4];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(&reply, b"PONG");

    drop(client);
    proxy.stop().await.unwrap();
}

/// 一个代理的上游不可达，不影响同一进程中另一个会话的转发
#[tokio::test]
async fn test_dial_failure_does_not_disturb_active_session() {
    let backend = start_echo_backend().await;
    let proxy = start_proxy(backend).await;

    // 建立一个活跃会话
    let mut active = proxy.connect().await;
    active.write_all(b"before").await.unwrap();
    let mut buf = [0u8; 6];
    active.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"before");

    // 另一个指向不可达上游的代理上发生多次拨号失败
    let broken = start_proxy(unused_addr()).await;
    for _ in 0..5 {
        let mut client = broken.connect().await;
        assert_closed_within(&mut client, CLOSE_WINDOW).await;
    }

    // 活跃会话仍然正常
    active.write_all(b"after!").await.unwrap();
    active.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"after!");

    drop(active);
    broken.stop().await.unwrap();
    proxy.stop().await.unwrap();
}

/// 50 个并发客户端各自只收到属于自己的回复
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_have_no_crosstalk() {
    // 后端将收到的请求加上前缀后返回
    let backend = start_backend(|mut stream| async move {
        // 请求固定为 "client-NN"
        let mut buf = [0u8; 9];
        stream.read_exact(&mut buf).await.unwrap();
        let mut reply = b"ack:".to_vec();
        reply.extend_from_slice(&buf);
        stream.write_all(&reply).await.unwrap();
        let _ = stream.read(&mut buf).await;
    })
    .await;
    let proxy = start_proxy(backend).await;
    let addr = proxy.addr;

    let mut tasks = Vec::with_capacity(50);
    for i in 0..50 {
        tasks.push(tokio::spawn(async move {
            let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
            let request = format!("client-{:02}", i);
            client.write_all(request.as_bytes()).await.unwrap();

            let expected = format!("ack:{}", request);
            let mut reply = vec![0u8; expected.len()];
            client.read_exact(&mut reply).await.unwrap();
            assert_eq!(String::from_utf8(reply).unwrap(), expected);
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    proxy.stop().await.unwrap();
}

/// 任意数量的会话结束（正常或异常）后，接收器仍继续接受新连接
#[tokio::test]
async fn test_acceptor_keeps_accepting_after_sessions_end() {
    let backend = start_echo_backend().await;
    let proxy = start_proxy(backend).await;

    for i in 0..20 {
        let mut client = proxy.connect().await;
        client.write_all(b"x").await.unwrap();
        let mut buf = [0u8; 1];
        client.read_exact(&mut buf).await.unwrap();

        if i % 2 == 0 {
            // 正常关闭写方向
            client.shutdown().await.unwrap();
            assert_closed_within(&mut client, CLOSE_WINDOW).await;
        } else {
            // 直接丢弃连接
            drop(client);
        }
    }

    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut client = proxy.connect().await;
    client.write_all(b"still alive").await.unwrap();
    let mut buf = [0u8; 11];
    client.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"still alive");

    drop(client);
    proxy.stop().await.unwrap();
}
