//! In-process HTTP stub standing in for the IANA bootstrap endpoint, RDAP
//! servers and the WHOIS API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Clone)]
struct Route {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

/// Minimal HTTP/1.1 server: one thread per connection, routes by path.
pub struct StubServer {
    addr: SocketAddr,
    routes: Arc<Mutex<HashMap<String, Route>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        let routes: Arc<Mutex<HashMap<String, Route>>> = Arc::default();
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
        self.insert(path, status, body.into(), None);
    }

    /// Like `route`, but wait `delay` before answering.
    pub fn route_delayed(&self, path: &str, status: u16, body: impl Into<String>, delay: Duration) {
        self.insert(path, status, body.into(), Some(delay));
    }

    fn insert(&self, path: &str, status: u16, body: String, delay: Option<Duration>) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Route { status, body, delay });
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Request targets (path plus query) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose path equals `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|target| target.split('?').next() == Some(path))
            .count()
    }
}

fn serve(
    mut stream: TcpStream,
    routes: Arc<Mutex<HashMap<String, Route>>>,
    requests: Arc<Mutex<Vec<String>>>,
) {
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
    let route = routes.lock().unwrap().get(path).cloned().unwrap_or(Route {
        status: 404,
        body: String::new(),
        delay: None,
    });

    if let Some(delay) = route.delay {
        thread::sleep(delay);
    }

    let reason = if route.status == 200 { "OK" } else { "Stub" };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        route.status,
        reason,
        route.body.len(),
        route.body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Bootstrap document with one service entry per `(tld, prefix)` pair,
/// pointing at `<stub><prefix>`.
pub fn bootstrap_doc(server: &StubServer, entries: &[(&str, &str)]) -> String {
    let services: Vec<serde_json::Value> = entries
        .iter()
        .map(|(tld, prefix)| serde_json::json!([[tld], [server.url(prefix)]]))
        .collect();

    serde_json::json!({
        "description": "RDAP bootstrap file for Domain Name System registrations",
        "publication": "2024-05-01T00:00:00Z",
        "services": services,
        "version": "1.0"
    })
    .to_string()
}

/// RDAP domain object for `example.com` as a registry would return it.
pub fn example_com_rdap() -> String {
    serde_json::json!({
        "objectClassName": "domain",
        "ldhName": "EXAMPLE.COM",
        "status": ["client delete prohibited", "client transfer prohibited"],
        "events": [
            {"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"},
            {"eventAction": "expiration", "eventDate": "2025-08-13T04:00:00Z"}
        ],
        "entities": [
            {
                "objectClassName": "entity",
                "handle": "376",
                "roles": ["registrar"],
                "vcardArray": ["vcard", [["fn", {}, "text", "RESERVED-Internet Assigned Numbers Authority"]]]
            }
        ],
        "nameservers": [
            {"objectClassName": "nameserver", "ldhName": "A.IANA-SERVERS.NET"},
            {"objectClassName": "nameserver", "ldhName": "B.IANA-SERVERS.NET"}
        ],
        "secureDNS": {"delegationSigned": true}
    })
    .to_string()
}

/// WHOIS API success body.
pub fn whois_body(registrar: &str) -> String {
    serde_json::json!({
        "parsedData": {
            "domainName": "example.com",
            "registrar": registrar,
            "creationDate": "1995-08-14",
            "nameservers": ["a.iana-servers.net"],
            "status": ["clientDeleteProhibited"],
            "dnssec": "signedDelegation",
            "whoisServer": "whois.verisign-grs.com"
        },
        "rawData": "Domain Name: EXAMPLE.COM\nRegistrar: ..."
    })
    .to_string()
}
