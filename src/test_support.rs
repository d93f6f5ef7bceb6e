//! Helpers shared by unit tests that talk HTTP
//!
//! A one-shot server on a loopback port stands in for API-Football so the
//! client and the orchestrator can be exercised end to end.

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves a single canned HTTP response.
///
/// Returns the base URL to point a client at and a handle resolving to the
/// raw request text that was received.
pub async fn serve_once(
    status_line: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener should have an address");

    let mut response = format!(
        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n",
        status_line,
        body.len()
    );
    for (name, value) in headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str("\r\n");
    response.push_str(body);

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("Failed to accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.expect("Failed to read request");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        socket
            .write_all(response.as_bytes())
            .await
            .expect("Failed to write response");
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{}", addr), handle)
}

/// Base URL of a loopback port nothing is listening on
pub async fn unused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener should have an address");
    drop(listener);
    format!("http://{}", addr)
}

/// A successful API-Football body with one fixture per `(id, elapsed)` pair
pub fn fixtures_body(fixtures: &[(u64, Option<u32>)]) -> String {
    let response: Vec<_> = fixtures
        .iter()
        .map(|(id, elapsed)| {
            json!({
                "fixture": { "id": id, "status": { "long": "First Half", "elapsed": elapsed } },
                "league": { "name": "Eredivisie" },
                "teams": {
                    "home": { "name": format!("Home {}", id) },
                    "away": { "name": format!("Away {}", id) }
                },
                "goals": { "home": 1, "away": 0 },
                "events": [{ "type": "Goal", "detail": "Normal Goal" }]
            })
        })
        .collect();

    json!({ "errors": [], "results": fixtures.len(), "response": response }).to_string()
}
