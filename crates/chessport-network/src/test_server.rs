//! One-shot HTTP server on a local port, for exercising the real clients.

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

pub(crate) struct OneShotServer {
    pub base_url: String,
    request: JoinHandle<String>,
}

impl OneShotServer {
    /// Answers the first request with `response` as raw bytes, then closes.
    pub async fn start(response: String) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind local port");
        let addr = listener.local_addr().expect("local address");
        let request = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept client");
            let raw = read_request(&mut stream).await;
            stream
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            let _ = stream.shutdown().await;
            raw
        });
        Self {
            base_url: format!("http://{addr}"),
            request,
        }
    }

    pub async fn reply(status: &str, body: &str) -> Self {
        Self::start(format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
        .await
    }

    /// The raw request the client sent.
    pub async fn request(self) -> String {
        self.request.await.expect("server task finished")
    }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
