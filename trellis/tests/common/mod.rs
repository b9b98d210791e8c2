#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use trellis::{Event, EventRequest, EventResponse, Next};

// ============================================================================
// Logging
// ============================================================================

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Argument Recording
// ============================================================================

/// Which arguments a handler observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seen {
    Event,
    Classic,
    Middleware,
}

#[derive(Clone, Default)]
pub struct CallLog {
    pub seen: Arc<Mutex<Vec<Seen>>>,
    pub count: Arc<AtomicUsize>,
}

impl CallLog {
    pub fn record(&self, seen: Seen) {
        self.seen.lock().unwrap().push(seen);
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn event_handler(
    log: CallLog,
) -> impl Fn(Event) -> std::future::Ready<()> + Send + Sync + 'static {
    move |_event: Event| {
        log.record(Seen::Event);
        std::future::ready(())
    }
}

pub fn classic_handler(
    log: CallLog,
) -> impl Fn(EventRequest, EventResponse) -> std::future::Ready<()> + Send + Sync + 'static {
    move |_req: EventRequest, _res: EventResponse| {
        log.record(Seen::Classic);
        std::future::ready(())
    }
}

pub fn middleware_handler(
    log: CallLog,
) -> impl Fn(EventRequest, EventResponse, Next) -> std::future::Ready<()> + Send + Sync + 'static {
    move |_req: EventRequest, _res: EventResponse, next: Next| {
        log.record(Seen::Middleware);
        next.proceed();
        std::future::ready(())
    }
}
