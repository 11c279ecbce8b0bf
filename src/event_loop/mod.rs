//! Cooperative, single-threaded scheduler.
//!
//! All node, proxy and session state lives on one logical thread and is
//! mutated from callbacks run by this loop. Each turn:
//! 1. Run the tasks that were posted before the turn began.
//! 2. Drain every watched channel into its handler.
//!
//! Tasks posted while a turn is running are deferred to the next turn.
//! Work produced on other threads reaches the loop only through a
//! [`Marshaller`], which also wakes a blocked [`EventLoop::wait_for_events`].

pub mod notifier;

pub use notifier::Notifier;

use crate::config::EventLoopConfig;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

type Task = Box<dyn FnOnce()>;

/// A channel drained by the loop on every turn.
trait Watcher {
    fn pending(&self) -> bool;
    fn dispatch(&mut self) -> usize;
    fn is_active(&self) -> bool;
}

struct ChannelWatcher<T, F> {
    rx: Receiver<T>,
    handler: F,
    active: bool,
}

impl<T, F> Watcher for ChannelWatcher<T, F>
where
    F: FnMut(T) -> bool,
{
    fn pending(&self) -> bool {
        self.active && !self.rx.is_empty()
    }

    fn dispatch(&mut self) -> usize {
        let mut handled = 0;
        while self.active {
            match self.rx.try_recv() {
                Ok(msg) => {
                    handled += 1;
                    if !(self.handler)(msg) {
                        self.active = false;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.active = false,
            }
        }
        handled
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[derive(Default)]
struct LoopState {
    tasks: VecDeque<Task>,
    watchers: Vec<Rc<RefCell<dyn Watcher>>>,
    turns: u64,
}

/// Thread-safe sender whose messages are handled on the loop's thread.
pub struct Marshaller<T> {
    tx: Sender<T>,
    wake: Sender<()>,
}

impl<T> Clone for Marshaller<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            wake: self.wake.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Marshaller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marshaller").finish_non_exhaustive()
    }
}

impl<T> Marshaller<T> {
    /// Queue `msg` for delivery. Returns `false` if the receiving side is gone.
    pub fn send(&self, msg: T) -> bool {
        if self.tx.send(msg).is_err() {
            return false;
        }
        let _ = self.wake.send(());
        true
    }
}

/// Handle to the cooperative scheduler. Clones share the same loop.
#[derive(Clone)]
pub struct EventLoop {
    state: Rc<RefCell<LoopState>>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    config: EventLoopConfig,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        Self::with_config(EventLoopConfig::default())
    }

    pub fn with_config(config: EventLoopConfig) -> Self {
        let (wake_tx, wake_rx) = unbounded();
        Self {
            state: Rc::new(RefCell::new(LoopState::default())),
            wake_tx,
            wake_rx,
            config,
        }
    }

    /// Longest a single blocking wait sleeps before re-checking.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.config.wait_timeout_ms.max(1))
    }

    /// Number of completed turns.
    pub fn turns(&self) -> u64 {
        self.state.borrow().turns
    }

    /// Run `task` on the next turn of the loop.
    pub fn post(&self, task: impl FnOnce() + 'static) {
        self.state.borrow_mut().tasks.push_back(Box::new(task));
    }

    /// Drain `rx` into `handler` on every turn until the handler returns
    /// `false` or every sender hangs up.
    pub fn watch<T, F>(&self, rx: Receiver<T>, handler: F)
    where
        T: 'static,
        F: FnMut(T) -> bool + 'static,
    {
        let watcher: Rc<RefCell<dyn Watcher>> = Rc::new(RefCell::new(ChannelWatcher {
            rx,
            handler,
            active: true,
        }));
        self.state.borrow_mut().watchers.push(watcher);
    }

    /// Create a sender that may be moved to another thread; its messages are
    /// delivered to `handler` on this loop.
    pub fn marshaller<T, F>(&self, handler: F) -> Marshaller<T>
    where
        T: Send + 'static,
        F: FnMut(T) -> bool + 'static,
    {
        let (tx, rx) = unbounded();
        self.watch(rx, handler);
        Marshaller {
            tx,
            wake: self.wake_tx.clone(),
        }
    }

    /// Whether a turn would have anything to do right now.
    pub fn has_pending(&self) -> bool {
        let state = self.state.borrow();
        !state.tasks.is_empty()
            || state
                .watchers
                .iter()
                .any(|w| w.try_borrow().map(|w| w.pending()).unwrap_or(false))
    }

    /// Run one turn. Returns the number of tasks and messages handled.
    pub fn process_events(&self) -> usize {
        while self.wake_rx.try_recv().is_ok() {}

        let batch: Vec<Task> = self.state.borrow_mut().tasks.drain(..).collect();
        let mut handled = batch.len();
        for task in batch {
            task();
        }

        let watchers: Vec<_> = self.state.borrow().watchers.clone();
        for watcher in &watchers {
            // A watcher already borrowed belongs to an outer turn that is
            // re-entering the loop; leave it to that turn.
            if let Ok(mut w) = watcher.try_borrow_mut() {
                handled += w.dispatch();
            }
        }

        let mut state = self.state.borrow_mut();
        state
            .watchers
            .retain(|w| w.try_borrow().map(|w| w.is_active()).unwrap_or(true));
        state.turns += 1;
        if handled > 0 {
            tracing::trace!("Event loop turn {} handled {} item(s)", state.turns, handled);
        }
        handled
    }

    /// Block until work may be available or `timeout` passes.
    ///
    /// Returns `true` if woken by pending work.
    pub fn wait_for_events(&self, timeout: Duration) -> bool {
        if self.has_pending() {
            return true;
        }
        self.wake_rx.recv_timeout(timeout).is_ok()
    }

    /// Keep turning the loop until `done` returns `true`.
    ///
    /// Returns `false` if `limit` elapsed first.
    pub fn run_until(&self, mut done: impl FnMut() -> bool, limit: Option<Duration>) -> bool {
        let deadline = limit.map(|l| Instant::now() + l);
        loop {
            if done() {
                return true;
            }
            if self.process_events() > 0 {
                continue;
            }
            if done() {
                return true;
            }
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    (deadline - now).min(self.wait_timeout())
                }
                None => self.wait_timeout(),
            };
            self.wait_for_events(wait);
        }
    }
}
