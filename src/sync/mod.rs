//! Message synchronization core.
//!
//! [`ChatSync`] owns the ordered message collection and the two independent
//! lifecycles (load and send). All mutation funnels through one
//! `watch::Sender`, which serializes writers and notifies subscribers.
//! Work between network calls is synchronous, so a commit either applies
//! in full or not at all.

pub mod merge;
pub mod normalize;
pub mod state;

use std::slice;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::{debug, warn};
use tokio::sync::watch;

use crate::api::client::MessageTransport;
use crate::api::error::ApiError;
use crate::api::models::{CreateMessageRequest, MessageFilter};

pub use merge::merge;
pub use normalize::{DisplayMessage, NormalizeError, normalize, normalize_batch};
pub use state::{AsyncStatus, ChatSnapshot, OperationState};

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Logical endpoint name used when a created message cannot be normalized.
const CREATE_ENDPOINT: &str = "messages";

/// Handle to the synchronization core. Clones share the same state.
#[derive(Clone)]
pub struct ChatSync {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn MessageTransport>,
    page_size: usize,
    state: watch::Sender<ChatSnapshot>,
    load_generation: AtomicU64,
    send_generation: AtomicU64,
    started: AtomicBool,
    closed: AtomicBool,
}

impl Inner {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ChatSync {
    pub fn new(transport: impl MessageTransport + 'static) -> Self {
        Self::with_page_size(transport, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(transport: impl MessageTransport + 'static, page_size: usize) -> Self {
        let (state, _) = watch::channel(ChatSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                transport: Arc::new(transport),
                page_size: page_size.max(1),
                state,
                load_generation: AtomicU64::new(0),
                send_generation: AtomicU64::new(0),
                started: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Spawns the initial load on the current tokio runtime.
    pub fn start(self) -> Self {
        let core = self.clone();
        tokio::spawn(async move { core.initial_load().await });
        self
    }

    pub fn page_size(&self) -> usize {
        self.inner.page_size
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver that wakes on every committed change.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.inner.state.subscribe()
    }

    /// Stops every in-flight operation from committing. Requests already on
    /// the wire still complete; their results are dropped.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }

    /// First load. Runs at most once per core; later calls return at once.
    pub async fn initial_load(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.load().await;
    }

    /// Fetches the latest page again. Overlapping calls are allowed; only
    /// the most recently started one may commit.
    pub async fn reload(&self) {
        self.load().await;
    }

    async fn load(&self) {
        let inner = &*self.inner;
        let generation = inner.load_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let started = inner.state.send_if_modified(|state| {
            if inner.is_closed() {
                return false;
            }
            state.load.start();
            true
        });
        if !started {
            return;
        }

        let filter = MessageFilter::with_limit(inner.page_size);
        let result = inner.transport.fetch_messages(&filter).await.map(|batch| {
            let (messages, rejected) = normalize_batch(batch);
            for err in &rejected {
                warn!("dropping {err}");
            }
            messages
        });

        inner.state.send_if_modified(|state| {
            if inner.is_closed() || inner.load_generation.load(Ordering::SeqCst) != generation {
                debug!("discarding superseded load #{generation}");
                return false;
            }
            match result {
                Ok(batch) => {
                    debug!("load #{generation} committed {} messages", batch.len());
                    state.messages = merge(&state.messages, &batch);
                    state.load.succeed();
                }
                Err(err) => {
                    warn!("load #{generation} failed: {err}");
                    state.load.fail(err);
                }
            }
            true
        });
    }

    /// Sends a message. The draft stays with the caller; the return value
    /// says whether the server's copy made it into the collection.
    ///
    /// A successful send always merges its message. Only the most recently
    /// started send decides the send lifecycle's status.
    pub async fn send_message(&self, request: &CreateMessageRequest) -> bool {
        let inner = &*self.inner;
        let generation = inner.send_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let started = inner.state.send_if_modified(|state| {
            if inner.is_closed() {
                return false;
            }
            state.send.start();
            true
        });
        if !started {
            return false;
        }

        let result = inner
            .transport
            .create_message(request)
            .await
            .and_then(|message| normalize(message).map_err(|e| ApiError::wrap(CREATE_ENDPOINT, e)));

        let mut committed = false;
        inner.state.send_if_modified(|state| {
            if inner.is_closed() {
                debug!("discarding send #{generation} after close");
                return false;
            }
            let latest = inner.send_generation.load(Ordering::SeqCst) == generation;
            match result {
                Ok(message) => {
                    state.messages = merge(&state.messages, slice::from_ref(&message));
                    if latest {
                        state.send.succeed();
                    }
                    committed = true;
                    true
                }
                Err(err) => {
                    warn!("send #{generation} failed: {err}");
                    if latest {
                        state.send.fail(err);
                    }
                    latest
                }
            }
        });
        committed
    }
}
