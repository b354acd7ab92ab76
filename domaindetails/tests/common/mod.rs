//! In-process HTTP stub serving the bootstrap document, RDAP answers and
//! WHOIS API answers to the CLI binary under test.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

type Routes = Arc<Mutex<HashMap<String, (u16, String)>>>;

/// Minimal HTTP/1.1 server: one thread per connection, routes by path.
pub struct StubServer {
    addr: SocketAddr,
    routes: Routes,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        let routes: Routes = Arc::default();
        let requests: Arc<Mutex<Vec<String>>> = Arc::default();

        let (accept_routes, accept_requests) = (routes.clone(), requests.clone());
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = accept_routes.clone();
                let requests = accept_requests.clone();
                thread::spawn(move || serve(stream, routes, requests));
            }
        });

        Self {
            addr,
            routes,
            requests,
        }
    }

    /// Serve `body` with `status` for GET `path` (query string ignored).
    pub fn route(&self, path: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.into()));
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Number of requests whose path equals `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|target| target.split('?').next() == Some(path))
            .count()
    }
}

fn serve(mut stream: TcpStream, routes: Routes, requests: Arc<Mutex<Vec<String>>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let target = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    requests.lock().unwrap().push(target.clone());

    let path = target.split('?').next().unwrap_or("/");
    let (status, body) = routes
        .lock()
        .unwrap()
        .get(path)
        .cloned()
        .unwrap_or((404, String::new()));

    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Bootstrap document mapping `com` and `net` to `/rdap/com/` on the stub.
pub fn bootstrap_doc(server: &StubServer) -> String {
    serde_json::json!({
        "description": "RDAP bootstrap file for Domain Name System registrations",
        "publication": "2024-05-01T00:00:00Z",
        "services": [[["com", "net"], [server.url("/rdap/com/")]]],
        "version": "1.0"
    })
    .to_string()
}

/// RDAP domain object for `example.com`.
pub fn example_com_rdap() -> String {
    serde_json::json!({
        "objectClassName": "domain",
        "ldhName": "EXAMPLE.COM",
        "status": ["client delete prohibited"],
        "events": [
            {"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"},
            {"eventAction": "expiration", "eventDate": "2025-08-13T04:00:00Z"}
        ],
        "entities": [
            {"objectClassName": "entity", "handle": "376", "roles": ["registrar"]}
        ],
        "nameservers": [
            {"objectClassName": "nameserver", "ldhName": "A.IANA-SERVERS.NET"}
        ],
        "secureDNS": {"delegationSigned": true}
    })
    .to_string()
}
