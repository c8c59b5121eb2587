//! Minimal HTTP/1.1 server standing in for the scoring API in integration tests.
//!
//! Responses are scripted per probed url (the `url` query parameter). Each
//! request consumes the next scripted response; the last one repeats.
//! Every request's query is recorded for assertions.

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct Scripted {
    pub status: u16,
    pub body: String,
}

impl Scripted {
    pub fn ok(performance: f64) -> Self {
        Self {
            status: 200,
            body: scored_body(performance),
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({
            "error": {"code": status, "message": message, "errors": []}
        })
        .to_string();
        Self { status, body }
    }
}

/// A PageSpeed-shaped success payload.
pub fn scored_body(performance: f64) -> String {
    serde_json::json!({
        "lighthouseResult": {
            "categories": {
                "performance": {"score": performance},
                "accessibility": {"score": 0.88},
                "seo": {"score": 0.92},
                "best-practices": {"score": 0.79}
            },
            "audits": {
                "first-contentful-paint": {"numericValue": 950.0},
                "largest-contentful-paint": {"numericValue": 2400.0},
                "cumulative-layout-shift": {"numericValue": 0.01},
                "max-potential-fid": {"numericValue": 80.0}
            }
        }
    })
    .to_string()
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, VecDeque<Scripted>>,
    requests: Vec<HashMap<String, Vec<String>>>,
}

#[derive(Clone)]
pub struct ScoreServer {
    pub endpoint: String,
    state: Arc<Mutex<State>>,
}

impl ScoreServer {
    /// Starts a server in a background thread. Runs until the process exits.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(State::default()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            endpoint: format!("http://127.0.0.1:{}/pagespeedonline/v5/runPagespeed", port),
            state,
        }
    }

    pub fn script(&self, url: &str, responses: Vec<Scripted>) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(url.to_string(), responses.into());
    }

    /// Query parameters of every request received so far.
    pub fn requests(&self) -> Vec<HashMap<String, Vec<String>>> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|q| q.get("url").is_some_and(|v| v.iter().any(|u| u == url)))
            .count()
    }
}

fn handle(mut stream: std::net::TcpStream, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let query = parse_query(request);
    let target = query
        .get("url")
        .and_then(|v| v.first())
        .cloned()
        .unwrap_or_default();

    let response = {
        let mut st = state.lock().unwrap();
        st.requests.push(query);
        match st.scripts.get_mut(&target) {
            Some(q) if q.len() > 1 => q.pop_front(),
            Some(q) => q.front().cloned(),
            None => None,
        }
    }
    .unwrap_or_else(|| Scripted::error(400, "Invalid URL: unscripted target"));

    let head = format!(
        "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(response.body.as_bytes());
}

/// Query parameters of the request line (`GET /path?a=b HTTP/1.1`).
fn parse_query(request: &str) -> HashMap<String, Vec<String>> {
    let mut out: HashMap<String, Vec<String>> = HashMap::new();
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("");
    if let Some((_, query)) = target.split_once('?') {
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            out.entry(k.into_owned()).or_default().push(v.into_owned());
        }
    }
    out
}
