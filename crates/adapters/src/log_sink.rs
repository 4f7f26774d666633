//! Log sinks receiving pre-formatted JSON lines.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// A sink that receives pre-formatted log lines.
pub trait LogSink: Send + Sync {
    /// Write a line to the sink.
    fn write_line(&self, line: &str);
}

/// Log sink that writes to stderr, keeping stdout free for command output.
#[derive(Debug, Default)]
pub struct StderrLogSink;

impl LogSink for StderrLogSink {
    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(error) = stderr.write_all(line.as_bytes()) {
            eprintln!("log sink write failed: {error}");
        }
    }
}

/// Log sink that keeps lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    /// Drain the captured lines.
    pub fn take(&self) -> Vec<String> {
        let mut guard = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }
}

impl LogSink for MemoryLogSink {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_drains_in_order() {
        let sink = MemoryLogSink::default();
        sink.write_line("first\n");
        sink.write_line("second\n");

        assert_eq!(sink.take(), vec!["first\n".to_string(), "second\n".to_string()]);
        assert!(sink.take().is_empty());
    }
}
