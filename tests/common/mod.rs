#![allow(dead_code)]

use anyhow::Result;
use dashboard::DashboardClient;
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{mpsc, Arc, Mutex, Once};
use std::thread;
use std::time::Duration;

pub fn ensure_test_env() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[derive(Clone)]
pub struct StubResponse {
    status: &'static str,
    content_type: &'static str,
    body: String,
    delay: Duration,
}

impl StubResponse {
    pub fn json(body: Value) -> Self {
        Self {
            status: "200 OK",
            content_type: "application/json",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(status: &'static str, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Minimal HTTP/1.1 server on a random local port. Routes match when the
/// request target (path plus query) starts with the route key; the first
/// match wins and anything else gets a 404.
pub struct DashboardStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DashboardStub {
    pub fn start(routes: Vec<(&str, StubResponse)>) -> Result<Self> {
        let mut listener: Option<TcpListener> = None;
        for _ in 0..64 {
            let port = fastrand::u16(40_000..60_000);
            if let Ok(bound) = TcpListener::bind(("127.0.0.1", port)) {
                listener = Some(bound);
                break;
            }
        }
        let listener = match listener {
            Some(listener) => listener,
            None => TcpListener::bind("127.0.0.1:0")?,
        };
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        let base_url = format!("http://{}", addr);
        let (shutdown, shutdown_rx) = mpsc::channel();

        let routes: Arc<Vec<(String, StubResponse)>> = Arc::new(
            routes
                .into_iter()
                .map(|(key, response)| (key.to_string(), response))
                .collect(),
        );
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        let handle = thread::spawn(move || loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }
            match listener.accept() {
                Ok((stream, _)) => {
                    let routes = Arc::clone(&routes);
                    let recorded = Arc::clone(&recorded);
                    let _ = stream.set_nonblocking(false);
                    // One thread per connection so delayed routes do not block others.
                    thread::spawn(move || {
                        let _ = handle_request(stream, &routes, &recorded);
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => {
                    thread::sleep(Duration::from_millis(5));
                }
            }
        });

        Ok(Self {
            base_url,
            requests,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn client(&self) -> DashboardClient {
        DashboardClient::new(&self.base_url, Some(Duration::from_secs(5)))
            .expect("stub client should build")
    }

    /// Request targets (path and query) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Drop for DashboardStub {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn handle_request(
    mut stream: TcpStream,
    routes: &[(String, StubResponse)],
    recorded: &Mutex<Vec<String>>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(());
    }

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return Ok(());
    }
    let method = parts[0];
    let target = parts[1].to_string();

    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 {
            break;
        }
        if header == "\r\n" {
            break;
        }
    }

    if let Ok(mut requests) = recorded.lock() {
        requests.push(target.clone());
    }

    let matched = routes
        .iter()
        .find(|(key, _)| method == "GET" && target.starts_with(key.as_str()))
        .map(|(_, response)| response.clone());

    match matched {
        Some(response) => {
            if !response.delay.is_zero() {
                thread::sleep(response.delay);
            }
            write_response(&mut stream, &response)
        }
        None => write_response(&mut stream, &StubResponse::raw("404 Not Found", "")),
    }
}

fn write_response(stream: &mut TcpStream, response: &StubResponse) -> std::io::Result<()> {
    let payload = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.content_type,
        response.body.len(),
        response.body
    );
    stream.write_all(payload.as_bytes())
}

/// A base URL nothing is listening on.
pub fn closed_port_url() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}
