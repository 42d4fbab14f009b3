//! Bounded per-request issuance log
//!
//! Attached to the in-flight task handle and discarded when the task
//! completes and its result is durably persisted; never a process-wide
//! singleton.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Default number of retained lines
const DEFAULT_CAPACITY: usize = 200;

/// Capped append-only line buffer
#[derive(Debug)]
pub struct IssuanceLogBuffer {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
}

impl IssuanceLogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            lines: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, line: String) {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// The most recent `n` lines, oldest first
    pub fn tail(&self, n: usize) -> Vec<String> {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.iter().rev().take(n).rev().cloned().collect()
    }

    pub fn snapshot(&self) -> Vec<String> {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.iter().cloned().collect()
    }
}

impl Default for IssuanceLogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_tail() {
        let buffer = IssuanceLogBuffer::new(10);
        buffer.push("one".to_string());
        buffer.push("two".to_string());
        buffer.push("three".to_string());

        assert_eq!(buffer.tail(2), vec!["two", "three"]);
        assert_eq!(buffer.snapshot().len(), 3);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let buffer = IssuanceLogBuffer::new(3);
        for i in 0..5 {
            buffer.push(format!("line-{}", i));
        }

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot, vec!["line-2", "line-3", "line-4"]);
    }

    #[test]
    fn test_tail_larger_than_content() {
        let buffer = IssuanceLogBuffer::new(10);
        buffer.push("only".to_string());
        assert_eq!(buffer.tail(50), vec!["only"]);
    }
}
