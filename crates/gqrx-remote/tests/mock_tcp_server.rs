//! GqrxClient over a real loopback socket against scripted replies.

use std::time::Duration;

use gqrx_core::{Error, Receiver};
use gqrx_remote::{ClientConfig, GqrxBuilder, GqrxClient, ScanConfig, Scanner};
use gqrx_test_harness::MockTcpServer;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

fn config_for(addr: &str) -> ClientConfig {
    let (host, port) = addr.rsplit_once(':').unwrap();
    ClientConfig {
        host: host.to_string(),
        port: port.parse().unwrap(),
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn transactions_over_tcp() {
    let mut server = MockTcpServer::new().await.unwrap();
    server.expect(b"F 145500000\n", b"RPRT 0\n");
    server.expect(b"f\n", b"145500000\n");
    server.expect(b"M NFM\n", b"RPRT 0\n");
    server.expect(b"l STRENGTH\n", b"-61.3\n");
    server.expect(b"c\n", b"RPRT 0\n");
    let config = config_for(server.addr());
    server.start();

    let mut client = GqrxClient::connect(&config).await.unwrap();
    assert!(client.set_frequency(145_500_000).await.unwrap());
    assert_eq!(client.get_frequency().await.unwrap(), 145_500_000);
    assert!(client.set_demod_mode("NFM").await.unwrap());
    assert_eq!(client.get_signal_strength().await.unwrap(), -61.3);
    client.close().await.unwrap();

    server.wait().await.unwrap();
}

#[tokio::test]
async fn split_reply_is_reassembled() {
    let mut server = MockTcpServer::new().await.unwrap();
    server.expect_chunked(b"f\n", &[b"4300", b"01000", b"\n"]);
    server.expect_chunked(b"AOS\n", &[b"RPRT ", b"0\n"]);
    let config = config_for(server.addr());
    server.start();

    let mut client = GqrxClient::connect(&config).await.unwrap();
    assert_eq!(client.get_frequency().await.unwrap(), 430_001_000);
    assert!(client.acquire_signal().await.unwrap());

    server.wait().await.unwrap();
}

#[tokio::test]
async fn peer_hangup_is_connection_lost() {
    let mut server = MockTcpServer::new().await.unwrap();
    server.expect_hangup(b"f\n");
    let config = config_for(server.addr());
    server.start();

    let mut client = GqrxClient::connect(&config).await.unwrap();
    let err = client.get_frequency().await.unwrap_err();
    assert!(err.is_connection_error(), "got {err:?}");

    // Teardown after a lost connection still succeeds.
    client.close().await.unwrap();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn read_timeout_surfaces_as_timeout() {
    // A peer that accepts the connection and never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = config_for(&listener.local_addr().unwrap().to_string());

    let mut client = GqrxBuilder::from_config(config)
        .read_timeout(Duration::from_millis(50))
        .build()
        .await
        .unwrap();
    let (_silent_peer, _) = listener.accept().await.unwrap();

    let err = client.get_frequency().await.unwrap_err();
    assert!(matches!(err, Error::Timeout), "got {err:?}");
    assert!(err.is_connection_error());
}

#[tokio::test]
async fn connection_refused_is_connection_error() {
    // Bind and release a port so nothing is listening on it.
    let addr = {
        let server = MockTcpServer::new().await.unwrap();
        server.addr().to_string()
    };

    let result = GqrxClient::connect(&config_for(&addr)).await;
    let err = result.err().unwrap();
    assert!(err.is_connection_error(), "got {err:?}");
}

#[tokio::test]
async fn cancel_interrupts_scan_waiting_on_silent_receiver() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = config_for(&listener.local_addr().unwrap().to_string());

    let mut client = GqrxBuilder::from_config(config)
        .read_timeout(Duration::from_millis(200))
        .build()
        .await
        .unwrap();
    let (_silent_peer, _) = listener.accept().await.unwrap();

    let scanner = Scanner::new(ScanConfig::default()).unwrap();
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let summary = scanner.run(&mut client, &cancel, |_| {}).await.unwrap();
    assert_eq!(summary.iterations, 0);

    // The abandoned reply never arrives; close() still releases the socket.
    client.close().await.unwrap();
    assert!(!client.is_connected());
}

#[tokio::test]
async fn late_reply_to_cancelled_scan_is_discarded() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = config_for(&listener.local_addr().unwrap().to_string());

    // Answers the scan's frequency read only after the scan has been
    // cancelled, then answers the follow-up query promptly.
    let receiver = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        assert_eq!(lines.next_line().await.unwrap().unwrap(), "f");
        tokio::time::sleep(Duration::from_millis(150)).await;
        write_half.write_all(b"430000000\n").await.unwrap();

        assert_eq!(lines.next_line().await.unwrap().unwrap(), "f");
        write_half.write_all(b"145000000\n").await.unwrap();

        assert_eq!(lines.next_line().await.unwrap().unwrap(), "c");
        write_half.write_all(b"RPRT 0\n").await.unwrap();
    });

    let mut client = GqrxClient::connect(&config).await.unwrap();
    let scanner = Scanner::new(ScanConfig::default()).unwrap();
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        canceller.cancel();
    });

    let summary = scanner.run(&mut client, &cancel, |_| {}).await.unwrap();
    assert_eq!(summary.iterations, 0);

    // The abandoned 430 MHz reply is drained, not returned here.
    assert_eq!(client.get_frequency().await.unwrap(), 145_000_000);
    client.close().await.unwrap();
    receiver.await.unwrap();
}
