// tests/proxy_tests/forwarding.rs

// 字节转发的正确性测试

use super::helpers::{start_backend, start_echo_backend, start_proxy};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

/// 客户端发送 PING，后端回复 PONG
#[tokio::test]
async fn test_ping_pong() {
    let backend = start_backend(|mut stream| async move {
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"PING");
        stream.write_all(b"PONG").await.unwrap();
        // 保持连接直到客户端关闭
        let _ = stream.read(&mut buf).await;
    })
    .await;
    let proxy = start_proxy(backend).await;

    let mut client = proxy.connect().await;
    client.write_all(b"PING").await.unwrap();

    let mut reply = [0u8; 4];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(&reply, b"PONG");

    drop(client);
    proxy.stop().await.unwrap();
}

/// 10 MiB 伪随机数据原样到达后端
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_large_payload_is_byte_identical() {
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(1);
    let backend = start_backend(move |mut stream| {
        let tx = tx.clone();
        async move {
            let mut received = Vec::new();
            stream.read_to_end(&mut received).await.unwrap();
            let _ = tx.send(received).await;
        }
    })
    .await;
    let proxy = start_proxy(backend).await;

    let mut payload = vec![0u8; 10 * 1024 * 1024];
    StdRng::seed_from_u64(0x5eed).fill(&mut payload[..]);

    let mut client = proxy.connect().await;
    client.write_all(&payload).await.unwrap();
    client.shutdown().await.unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received.len(), payload.len());
    assert!(received == payload, "backend received different bytes");

    proxy.stop().await.unwrap();
}

/// 双向同时传输时两个方向的字节顺序均保持不变
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bidirectional_echo_preserves_order() {
    let backend = start_echo_backend().await;
    let proxy = start_proxy(backend).await;

    let payload: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();

    let client = proxy.connect().await;
    let (mut reader, mut writer) = client.into_split();

    let write_task = tokio::spawn(async move {
        for chunk in payload.chunks(1500) {
            writer.write_all(chunk).await.unwrap();
        }
        writer
    });

    let mut echoed = vec![0u8; expected.len()];
    reader.read_exact(&mut echoed).await.unwrap();
    assert!(echoed == expected, "echoed bytes differ from sent bytes");

    let _writer = write_task.await.unwrap();
    proxy.stop().await.unwrap();
}

/// 后端先发送数据（如数据库握手问候）也能到达客户端
#[tokio::test]
async fn test_server_first_protocol() {
    let backend = start_backend(|mut stream| async move {
        stream.write_all(b"220 ready\r\n").await.unwrap();
        let mut buf = [0u8; 16];
        let _ = stream.read(&mut buf).await;
    })
    .await;
    let proxy = start_proxy(backend).await;

    let mut client = proxy.connect().await;
    let mut greeting = [0u8; 11];
    client.read_exact(&mut greeting).await.unwrap();
    assert_eq!(&greeting, b"220 ready\r\n");

    drop(client);
    proxy.stop().await.unwrap();
}
