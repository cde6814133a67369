//! Health and stats HTTP endpoint
//!
//! Serves liveness and a small JSON stats payload over a bare TCP listener,
//! one request per connection. This is the only surface the deployment
//! probes; the game transport lives elsewhere.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Rolling window size for tick-time percentiles
const TICK_HISTORY_LEN: usize = 1000;

/// Counters and gauges for the whole server process
#[derive(Debug)]
pub struct ServerStats {
    pub rooms_active: AtomicU64,
    pub players_total: AtomicU64,
    pub players_human: AtomicU64,
    pub players_bot: AtomicU64,
    pub ticks_total: AtomicU64,

    // Tick timing (microseconds)
    pub tick_time_us: AtomicU64,
    pub tick_time_p95_us: AtomicU64,

    start_time: Instant,
    tick_history: RwLock<VecDeque<u64>>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            rooms_active: AtomicU64::new(0),
            players_total: AtomicU64::new(0),
            players_human: AtomicU64::new(0),
            players_bot: AtomicU64::new(0),
            ticks_total: AtomicU64::new(0),
            tick_time_us: AtomicU64::new(0),
            tick_time_p95_us: AtomicU64::new(0),
            start_time: Instant::now(),
            tick_history: RwLock::new(VecDeque::with_capacity(TICK_HISTORY_LEN)),
        }
    }

    /// Record one tick's wall time and refresh the p95 gauge
    pub fn record_tick_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.tick_time_us.store(us, Ordering::Relaxed);
        self.ticks_total.fetch_add(1, Ordering::Relaxed);

        let mut history = self.tick_history.write();
        history.push_back(us);
        while history.len() > TICK_HISTORY_LEN {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();
            let p95_idx = (sorted.len() as f32 * 0.95) as usize;
            self.tick_time_p95_us
                .store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn to_json(&self) -> String {
        json!({
            "rooms": self.rooms_active.load(Ordering::Relaxed),
            "players": {
                "total": self.players_total.load(Ordering::Relaxed),
                "human": self.players_human.load(Ordering::Relaxed),
                "bot": self.players_bot.load(Ordering::Relaxed),
            },
            "performance": {
                "ticks_total": self.ticks_total.load(Ordering::Relaxed),
                "tick_time_us": self.tick_time_us.load(Ordering::Relaxed),
                "tick_time_p95_us": self.tick_time_p95_us.load(Ordering::Relaxed),
            },
            "uptime_seconds": self.uptime_seconds(),
        })
        .to_string()
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    )
}

/// Route a raw request line to a response
fn respond(request: &str, stats: &ServerStats) -> String {
    if request.starts_with("GET /health") {
        http_response("200 OK", "application/json", r#"{"status":"ok"}"#)
    } else if request.starts_with("GET /stats") {
        http_response("200 OK", "application/json", &stats.to_json())
    } else {
        http_response("404 Not Found", "text/plain", "")
    }
}

/// Start the health HTTP server
pub async fn start_health_server(
    stats: Arc<ServerStats>,
    bind_address: std::net::IpAddr,
    port: u16,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind_address, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("health endpoint listening on http://{}/health", addr);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let stats = stats.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];
            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);
                    let response = respond(&request, &stats);
                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("failed to write health response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("failed to read health request from {}: {}", peer, e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = ServerStats::new();
        assert_eq!(stats.rooms_active.load(Ordering::Relaxed), 0);
        assert_eq!(stats.ticks_total.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_tick_time() {
        let stats = ServerStats::new();
        for i in 0..100 {
            stats.record_tick_time(Duration::from_micros(100 + i * 10));
        }
        assert_eq!(stats.ticks_total.load(Ordering::Relaxed), 100);
        assert!(stats.tick_time_p95_us.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn test_json_payload() {
        let stats = ServerStats::new();
        stats.players_total.store(7, Ordering::Relaxed);
        stats.players_bot.store(3, Ordering::Relaxed);

        let payload = stats.to_json();
        assert!(payload.contains("\"total\":7"));
        assert!(payload.contains("\"bot\":3"));
        assert!(payload.contains("uptime_seconds"));
    }

    #[test]
    fn test_health_route() {
        let stats = ServerStats::new();
        let response = respond("GET /health HTTP/1.1\r\n", &stats);
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with(r#"{"status":"ok"}"#));
    }

    #[test]
    fn test_stats_route() {
        let stats = ServerStats::new();
        let response = respond("GET /stats HTTP/1.1\r\n", &stats);
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("\"rooms\""));
    }

    #[test]
    fn test_unknown_route() {
        let stats = ServerStats::new();
        let response = respond("GET /nope HTTP/1.1\r\n", &stats);
        assert!(response.starts_with("HTTP/1.1 404"));
    }
}
