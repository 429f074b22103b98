//! A small toast-notification queue.
//!
//! Toasts expire after a fixed lifetime measured against an injected clock;
//! subscribers are notified whenever the active set changes.

use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::engine::scheduler::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub deadline: Instant,
}

type Subscriber = Box<dyn FnMut(usize)>;

pub struct Toasts {
    clock: Rc<dyn Clock>,
    ttl: Duration,
    cap: usize,
    active: VecDeque<Toast>,
    subscribers: Vec<(u64, Subscriber)>,
    next_subscriber: u64,
}

impl Toasts {
    pub fn new(clock: Rc<dyn Clock>, ttl: Duration, cap: usize) -> Toasts {
        Toasts {
            clock,
            ttl,
            cap,
            active: VecDeque::new(),
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    pub fn push(&mut self, level: ToastLevel, message: impl Into<String>) {
        let deadline = self.clock.now() + self.ttl;
        self.active.push_back(Toast { level, message: message.into(), deadline });
        // Oldest toasts give way when the queue is full.
        while self.active.len() > self.cap {
            self.active.pop_front();
        }
        self.notify();
    }

    /// Drop expired toasts; call once per frame or on a timer.
    pub fn sweep(&mut self) {
        let now = self.clock.now();
        let before = self.active.len();
        self.active.retain(|toast| toast.deadline > now);
        if self.active.len() != before {
            self.notify();
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &Toast> { self.active.iter() }

    pub fn len(&self) -> usize { self.active.len() }

    pub fn is_empty(&self) -> bool { self.active.is_empty() }

    pub fn subscribe(&mut self, subscriber: impl FnMut(usize) + 'static) -> u64 {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: u64) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    fn notify(&mut self) {
        let count = self.active.len();
        let mut subscribers = std::mem::take(&mut self.subscribers);
        for (_, subscriber) in subscribers.iter_mut() {
            subscriber(count);
        }
        self.subscribers = subscribers;
    }
}
