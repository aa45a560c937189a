//! Minimal HTTP/1.1 stand-in for the GitHub API, one request per connection.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use traffic_stats::config::{Config, PathsConfig, ReadmeConfig};

pub struct Route {
    pub method: &'static str,
    pub path: String,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn new(method: &'static str, path: &str, status: u16, body: impl Into<String>) -> Self {
        Self {
            method,
            path: path.to_string(),
            status,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    /// Raw header block, lowercased.
    pub headers: String,
    pub body: String,
}

pub struct MockApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: JoinHandle<()>,
}

impl MockApi {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let Some(req) = read_request(&mut socket).await else {
                    continue;
                };
                let (status, body) = routes
                    .iter()
                    .find(|r| r.method == req.method && r.path == req.path)
                    .map(|r| (r.status, r.body.clone()))
                    .unwrap_or((501, "{\"message\":\"no route\"}".to_string()));
                log.lock().unwrap().push(req);

                let response = format!(
                    "HTTP/1.1 {status} {}\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    reason(status),
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            requests,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn find(&self, method: &str, path: &str) -> Option<Recorded> {
        self.requests()
            .into_iter()
            .find(|r| r.method == method && r.path == path)
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    Some(Recorded {
        method,
        path,
        headers: head.to_lowercase(),
        body,
    })
}

/// Config pointing at `api_url` with every output under `dir`.
pub fn test_config(api_url: &str, dir: &Path, gist_id: Option<&str>) -> Config {
    Config {
        repository: Some("octo/widgets".to_string()),
        token: Some("secret-token".to_string()),
        gist_id: gist_id.map(str::to_string),
        api_url: api_url.to_string(),
        paths: PathsConfig {
            snapshot: dir.join("stats_data.json"),
            daily_graph: dir.join("docs").join("stats_graph_daily.png"),
            cumulative_graph: dir.join("docs").join("stats_graph_cumulative.png"),
            readme: dir.join("README.md"),
        },
        readme: ReadmeConfig::default(),
    }
}

/// Body of a traffic endpoint response.
pub fn traffic_body(endpoint: &str, samples: &[(&str, u64)]) -> String {
    let list: Vec<_> = samples
        .iter()
        .map(|(ts, count)| serde_json::json!({ "timestamp": ts, "count": count, "uniques": 1 }))
        .collect();
    let total: u64 = samples.iter().map(|(_, c)| c).sum();
    let mut body = serde_json::json!({ "count": total, "uniques": 1 });
    body[endpoint] = serde_json::Value::Array(list);
    body.to_string()
}

/// Body of `GET /gists/{id}` holding `history` as the stats file.
pub fn gist_body(id: &str, history: &serde_json::Value) -> String {
    serde_json::json!({
        "id": id,
        "files": {
            "stats_history.json": {
                "filename": "stats_history.json",
                "truncated": false,
                "content": serde_json::to_string_pretty(history).unwrap(),
            }
        }
    })
    .to_string()
}
