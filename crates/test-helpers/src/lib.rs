//! In-process channel arbiters for tests.
//!
//! The real arbiter is an external service. Tests stand up an [`Arbiter`]
//! on a loopback port instead, either driven by a fixed script per
//! connection ([`Arbiter::scripted`]) or serving a word list the way a
//! deployment would ([`Arbiter::serving_words`]). Every line a station
//! sends is recorded with a timestamp so tests can assert on ordering and
//! pacing.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::debug;

/// Decides the reply to each line received on one connection.
pub trait Responder: Send + 'static {
    /// Raw bytes to write back (newlines included), or `None` to close.
    ///
    /// An empty string sends nothing and keeps the connection open.
    fn respond(&mut self, line: &str) -> Option<String>;
}

/// One step of a scripted connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbiterStep {
    /// Write these bytes verbatim.
    Reply(String),

    /// Close the connection instead of replying.
    Close,
}

impl ArbiterStep {
    /// Reply with the given lines, each newline-terminated, in a single write.
    pub fn lines(lines: &[&str]) -> Self {
        let mut out = String::new();
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
        ArbiterStep::Reply(out)
    }

    /// Reply with `HUH!`.
    pub fn reject() -> Self {
        Self::lines(&["HUH!"])
    }

    /// Reply with `IDLE`.
    pub fn idle() -> Self {
        Self::lines(&["IDLE"])
    }

    /// Reply with a busy probe answer.
    pub fn busy() -> Self {
        Self::lines(&["BUSY"])
    }
}

/// Plays back a fixed list of steps; closes when the list runs out.
struct ScriptResponder {
    steps: VecDeque<ArbiterStep>,
}

impl Responder for ScriptResponder {
    fn respond(&mut self, _line: &str) -> Option<String> {
        match self.steps.pop_front()? {
            ArbiterStep::Reply(bytes) => Some(bytes),
            ArbiterStep::Close => None,
        }
    }
}

/// Word-serving behaviour shared by every connection of an arbiter.
#[derive(Debug, Clone)]
pub struct WordService {
    /// Words handed out by offset.
    pub words: Arc<Vec<String>>,

    /// Words per granted reply line.
    pub per_reply: usize,

    /// Reject every n-th fetch on a connection with `HUH!` (0 = never).
    pub reject_every: u64,

    /// Busy replies before each `IDLE` answer to `BUSY?`.
    pub busy_before_idle: u32,
}

impl WordService {
    /// Serve `words`, `per_reply` at a time, never rejecting.
    pub fn new<S: AsRef<str>>(words: &[S], per_reply: usize) -> Self {
        Self {
            words: Arc::new(words.iter().map(|w| w.as_ref().to_string()).collect()),
            per_reply: per_reply.max(1),
            reject_every: 0,
            busy_before_idle: 0,
        }
    }

    /// Reject every n-th fetch.
    pub fn with_reject_every(mut self, n: u64) -> Self {
        self.reject_every = n;
        self
    }

    /// Answer `BUSY?` with a busy reply `n` times before each `IDLE`.
    pub fn with_busy_before_idle(mut self, n: u32) -> Self {
        self.busy_before_idle = n;
        self
    }
}

struct WordResponder {
    service: WordService,
    fetches: u64,
    busy_sent: u32,
}

impl Responder for WordResponder {
    fn respond(&mut self, line: &str) -> Option<String> {
        if line == "BUSY?" {
            if self.busy_sent < self.service.busy_before_idle {
                self.busy_sent += 1;
                return Some("BUSY\n".to_string());
            }
            self.busy_sent = 0;
            return Some("IDLE\n".to_string());
        }

        let Ok(offset) = line.trim().parse::<usize>() else {
            return Some("HUH!\n".to_string());
        };

        self.fetches += 1;
        if self.service.reject_every > 0 && self.fetches % self.service.reject_every == 0 {
            return Some("HUH!\n".to_string());
        }

        let words = &self.service.words;
        if offset >= words.len() {
            return Some("$$\n".to_string());
        }
        let end = (offset + self.service.per_reply).min(words.len());
        Some(format!("{}\n", words[offset..end].join(",")))
    }
}

/// A line received from a station.
#[derive(Debug, Clone)]
pub struct ReceivedLine {
    /// Connection index in accept order.
    pub connection: usize,

    /// The line, without its newline.
    pub line: String,

    /// When it arrived.
    pub at: Instant,
}

/// Loopback TCP arbiter.
pub struct Arbiter {
    addr: SocketAddr,
    log: Arc<Mutex<Vec<ReceivedLine>>>,
    accept_task: JoinHandle<()>,
}

impl Arbiter {
    /// Start an arbiter; `make_responder` is called once per accepted connection.
    pub async fn start<F, R>(mut make_responder: F) -> std::io::Result<Self>
    where
        F: FnMut(usize) -> R + Send + 'static,
        R: Responder,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let log = Arc::new(Mutex::new(Vec::new()));

        let accept_log = Arc::clone(&log);
        let accept_task = tokio::spawn(async move {
            let mut connection = 0usize;
            while let Ok((stream, _)) = listener.accept().await {
                let responder = make_responder(connection);
                tokio::spawn(serve(stream, connection, responder, Arc::clone(&accept_log)));
                connection += 1;
            }
        });

        Ok(Self {
            addr,
            log,
            accept_task,
        })
    }

    /// One script per connection, in accept order.
    ///
    /// Connections beyond the last script are closed on their first line.
    pub async fn scripted(scripts: Vec<Vec<ArbiterStep>>) -> std::io::Result<Self> {
        let mut scripts: VecDeque<_> = scripts.into_iter().map(VecDeque::from).collect();
        Self::start(move |_| ScriptResponder {
            steps: scripts.pop_front().unwrap_or_default(),
        })
        .await
    }

    /// Serve a word list to any number of connections.
    pub async fn serving_words(service: WordService) -> std::io::Result<Self> {
        Self::start(move |_| WordResponder {
            service: service.clone(),
            fetches: 0,
            busy_sent: 0,
        })
        .await
    }

    /// Listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Host part of the listening address.
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Port part of the listening address.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Everything received so far.
    pub fn received(&self) -> Vec<ReceivedLine> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Lines received on one connection, in order.
    pub fn received_on(&self, connection: usize) -> Vec<String> {
        self.received()
            .into_iter()
            .filter(|r| r.connection == connection)
            .map(|r| r.line)
            .collect()
    }
}

impl Drop for Arbiter {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve<R: Responder>(
    stream: TcpStream,
    connection: usize,
    mut responder: R,
    log: Arc<Mutex<Vec<ReceivedLine>>>,
) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if let Ok(mut log) = log.lock() {
            log.push(ReceivedLine {
                connection,
                line: line.clone(),
                at: Instant::now(),
            });
        }

        let Some(reply) = responder.respond(&line) else {
            debug!(connection, "arbiter closing connection");
            break;
        };
        if !reply.is_empty() && write.write_all(reply.as_bytes()).await.is_err() {
            break;
        }
    }
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}
