//! Integration tests for SlackMessenger
//!
//! These tests run the messenger against a minimal HTTP server on a local
//! TCP listener and check the form it posts and how it handles failures.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use turnlock_notify::{Messenger, SlackError, SlackMessenger, SlackSettings};

/// Read one HTTP request (headers and body) from the stream.
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buffer);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8(buffer).unwrap()
}

/// Serve one request with `status_line`, handing the raw request back.
async fn serve_once(status_line: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (request_tx, request_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let response = format!("HTTP/1.1 {status_line}\r\ncontent-length: 11\r\nconnection: close\r\n\r\n{{\"ok\":true}}");
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = request_tx.send(request);
    });

    (format!("http://{addr}/api/chat.postMessage"), request_rx)
}

#[tokio::test]
async fn test_posts_form_fields() {
    let (url, request) = serve_once("200 OK").await;
    let settings = SlackSettings::new(url, "xoxb-123").with_bot_name("doorbot");
    let messenger = SlackMessenger::new(settings).unwrap();

    messenger.post("general", "Door locked & safe").await.unwrap();

    let request = request.await.unwrap();
    assert!(request.starts_with("POST /api/chat.postMessage"));
    assert!(
        request
            .to_ascii_lowercase()
            .contains("content-type: application/x-www-form-urlencoded")
    );

    let body = request.split("\r\n\r\n").nth(1).unwrap();
    assert_eq!(
        body,
        "token=xoxb-123&channel=general&username=doorbot&text=Door+locked+%26+safe"
    );
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let (url, _request) = serve_once("403 Forbidden").await;
    let messenger = SlackMessenger::new(SlackSettings::new(url, "bad-token")).unwrap();

    let result = messenger.post("general", "hello").await;

    assert!(matches!(result, Err(SlackError::Status(403))));
}

#[tokio::test]
async fn test_send_swallows_failures() {
    // Bind then drop, so nothing is listening on the port.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let settings = SlackSettings::new(format!("http://{addr}/api"), "t0k3n")
        .with_timeout(Duration::from_millis(500));
    let messenger = SlackMessenger::new(settings).unwrap();

    assert!(messenger.post("general", "hello").await.is_err());
    // Fire-and-forget: returns normally.
    messenger.send("general", "hello").await;
}

#[tokio::test]
async fn test_request_timeout() {
    // Server accepts but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let settings = SlackSettings::new(format!("http://{addr}/api"), "t0k3n")
        .with_timeout(Duration::from_millis(200));
    let messenger = SlackMessenger::new(settings).unwrap();

    match messenger.post("general", "hello").await {
        Err(SlackError::Http(e)) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}
