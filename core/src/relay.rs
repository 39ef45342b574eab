//! Line-oriented log relay for the supervised client's output streams
//!
//! One reader thread per captured stream forwards decoded lines to a sink as
//! they arrive. Lines from different streams carry no ordering guarantee
//! relative to each other, only within their own stream. Read errors and EOF
//! end a reader loop silently; pipe closure on client termination is the
//! natural cancellation signal, so no explicit shutdown channel exists.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Default number of lines retained by a bounded display buffer.
pub const DEFAULT_RETENTION: usize = 10;

/// Which output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => write!(f, "stdout"),
            StreamKind::Stderr => write!(f, "stderr"),
        }
    }
}

/// Destination for relayed log lines. Implementations must tolerate calls
/// from multiple reader threads.
pub trait LogSink: Send + Sync {
    fn append(&self, origin: StreamKind, line: &str);
}

/// Prints each line to the console as it arrives.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn append(&self, origin: StreamKind, line: &str) {
        match origin {
            StreamKind::Stdout => println!("{}", line),
            StreamKind::Stderr => eprintln!("{}", line),
        }
    }
}

/// Retains only the most recent N lines, discarding the oldest.
#[derive(Debug)]
pub struct BoundedBuffer {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
}

impl BoundedBuffer {
    /// A zero capacity is clamped to one line so the buffer stays bounded.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Snapshot of the retained lines, oldest first.
    pub fn tail(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

impl Default for BoundedBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl LogSink for BoundedBuffer {
    fn append(&self, _origin: StreamKind, line: &str) {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        while lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.to_string());
    }
}

/// Appends timestamped lines to a log file.
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for FileSink {
    fn append(&self, origin: StreamKind, line: &str) {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        // A failed append is dropped like any other relay error
        let _ = writeln!(file, "{} [{}] {}", stamp, origin, line);
    }
}

/// Forwards every line to several sinks in order.
pub struct Fanout {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl Fanout {
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self { sinks }
    }
}

impl LogSink for Fanout {
    fn append(&self, origin: StreamKind, line: &str) {
        for sink in &self.sinks {
            sink.append(origin, line);
        }
    }
}

/// Spawn a fire-and-forget reader that drains `stream` line by line into
/// `sink`. The thread ends when the stream closes or a read fails.
pub fn spawn_reader<R>(stream: R, origin: StreamKind, sink: Arc<dyn LogSink>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(line) => sink.append(origin, &line),
                Err(_) => break,
            }
        }
        log::debug!("{} stream closed", origin);
    })
}
