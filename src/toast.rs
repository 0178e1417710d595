//! Bounded toast queue with explicit dismissal and expiry.
//!
//! Background tasks never touch the queue directly. They hold a
//! `ToastSender` and post messages; the UI loop drains them into the queue
//! once per tick and expires stale entries against the time it is handed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct ToastMessage {
    pub level: ToastLevel,
    pub message: String,
}

/// Cloneable handle for posting toasts from anywhere.
#[derive(Clone)]
pub struct ToastSender {
    tx: mpsc::UnboundedSender<ToastMessage>,
}

impl ToastSender {
    pub fn send(&self, level: ToastLevel, message: impl Into<String>) {
        // The queue outlives every sender in practice; a closed channel just drops the toast.
        let _ = self.tx.send(ToastMessage {
            level,
            message: message.into(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(ToastLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(ToastLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(ToastLevel::Error, message);
    }
}

pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    capacity: usize,
    ttl: Duration,
    next_id: u64,
    rx: mpsc::UnboundedReceiver<ToastMessage>,
}

impl ToastQueue {
    /// Create a queue and the sender that feeds it.
    pub fn new(capacity: usize, ttl: Duration) -> (Self, ToastSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Self {
            toasts: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            ttl,
            next_id: 0,
            rx,
        };
        (queue, ToastSender { tx })
    }

    /// Enqueue a toast, evicting the oldest one when full.
    pub fn push_at(&mut self, now: Instant, level: ToastLevel, message: impl Into<String>) -> u64 {
        if self.toasts.len() == self.capacity {
            self.toasts.pop_front();
        }
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push_back(Toast {
            id,
            level,
            message: message.into(),
            expires_at: now + self.ttl,
        });
        id
    }

    /// Pull in everything posted through a `ToastSender`, then expire.
    pub fn drain(&mut self, now: Instant) {
        while let Ok(msg) = self.rx.try_recv() {
            self.push_at(now, msg.level, msg.message);
        }
        self.expire(now);
    }

    pub fn expire(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires_at > now);
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Dismiss the most recent toast.
    pub fn dismiss_latest(&mut self) -> bool {
        match self.toasts.back().map(|t| t.id) {
            Some(id) => self.dismiss(id),
            None => false,
        }
    }

    /// Oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(capacity: usize) -> (ToastQueue, ToastSender) {
        ToastQueue::new(capacity, Duration::from_secs(5))
    }

    #[test]
    fn never_exceeds_capacity() {
        let (mut q, _tx) = queue(2);
        let now = Instant::now();
        q.push_at(now, ToastLevel::Info, "one");
        q.push_at(now, ToastLevel::Info, "two");
        q.push_at(now, ToastLevel::Info, "three");
        let messages: Vec<_> = q.visible().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn expired_toasts_are_removed() {
        let (mut q, _tx) = queue(4);
        let start = Instant::now();
        q.push_at(start, ToastLevel::Info, "early");
        q.push_at(start + Duration::from_secs(3), ToastLevel::Info, "late");
        q.expire(start + Duration::from_secs(5));
        let messages: Vec<_> = q.visible().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["late"]);
        q.expire(start + Duration::from_secs(9));
        assert!(q.is_empty());
    }

    #[test]
    fn dismiss_removes_exactly_one() {
        let (mut q, _tx) = queue(4);
        let now = Instant::now();
        let first = q.push_at(now, ToastLevel::Info, "a");
        q.push_at(now, ToastLevel::Error, "b");
        assert!(q.dismiss(first));
        assert!(!q.dismiss(first));
        assert_eq!(q.visible().count(), 1);
        assert!(q.dismiss_latest());
        assert!(!q.dismiss_latest());
    }

    #[test]
    fn drain_collects_sent_messages() {
        let (mut q, tx) = queue(4);
        let worker = tx.clone();
        worker.success("Loaded 12 listings");
        tx.error("Search failed");
        q.drain(Instant::now());
        let levels: Vec<_> = q.visible().map(|t| t.level).collect();
        assert_eq!(levels, vec![ToastLevel::Success, ToastLevel::Error]);
    }
}
