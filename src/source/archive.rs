//! Archive ingestion on a worker thread.
//!
//! The blocking parse runs on its own thread. Everything it produces,
//! including status changes, is marshalled back to the owning loop; no other
//! state crosses the thread boundary. Dropping the source stops and joins
//! the worker before the source's buffers are released.

use super::{DataSource, InterfaceRegistry, Mechanism, SourceBase, Status};
use crate::event_loop::{EventLoop, Marshaller};
use crate::node::{Node, NodeBase, NodeKind};
use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use url::Url;

/// Format-specific work performed by a [`ThreadedArchiveSource`].
pub trait ArchiveProcessor: Send + 'static {
    /// Unit of data handed from the worker to the loop thread.
    type Item: Send + 'static;

    /// Register the interfaces the source will deliver through.
    fn register_interfaces(&self, interfaces: &mut InterfaceRegistry);

    /// Read the archive at `uri`, emitting items as they are parsed.
    /// Runs on the worker thread. Returns `false` if the archive is unusable.
    fn process(&mut self, uri: &Url, emitter: &ArchiveEmitter<Self::Item>) -> bool;

    /// Publish one item through the source's interfaces. Runs on the loop
    /// thread.
    fn deliver(item: Self::Item, interfaces: &InterfaceRegistry);
}

enum ArchiveMessage<I> {
    Item(I),
    Status(Status),
}

/// Worker-side handle for sending results to the owning source.
pub struct ArchiveEmitter<I> {
    tx: Marshaller<ArchiveMessage<I>>,
    running: Arc<AtomicBool>,
}

impl<I> ArchiveEmitter<I> {
    /// Returns `false` once the source is gone.
    pub fn emit(&self, item: I) -> bool {
        self.tx.send(ArchiveMessage::Item(item))
    }

    /// Whether the source still wants data. Long parses should poll this.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn status(&self, status: Status) {
        self.tx.send(ArchiveMessage::Status(status));
    }
}

/// A data source that reads an archive on a worker thread.
pub struct ThreadedArchiveSource<P: ArchiveProcessor> {
    node: NodeBase,
    source: SourceBase,
    uri: Url,
    processor: Option<P>,
    worker: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    tx: Marshaller<ArchiveMessage<P::Item>>,
}

impl<P: ArchiveProcessor> ThreadedArchiveSource<P> {
    pub fn new(ev: &EventLoop, uri: Url, processor: P) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|weak: &Weak<RefCell<Self>>| {
            let weak = weak.clone();
            let tx = ev.marshaller(move |msg: ArchiveMessage<P::Item>| {
                let Some(this) = weak.upgrade() else {
                    return false;
                };
                this.borrow_mut().handle(msg);
                true
            });

            let node = NodeBase::new(ev)
                .with_kind(NodeKind::DataSource)
                .with_display_name(uri.as_str());
            let mut source = SourceBase::new(&node);
            processor.register_interfaces(source.interfaces_mut());

            RefCell::new(Self {
                node,
                source,
                uri,
                processor: Some(processor),
                worker: None,
                running: Arc::new(AtomicBool::new(true)),
                tx,
            })
        })
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    fn handle(&mut self, msg: ArchiveMessage<P::Item>) {
        match msg {
            ArchiveMessage::Item(item) => P::deliver(item, self.source.interfaces()),
            ArchiveMessage::Status(status) => {
                self.source.set_status(status);
            }
        }
    }
}

impl<P: ArchiveProcessor> Node for ThreadedArchiveSource<P> {
    fn base(&self) -> &NodeBase {
        &self.node
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.node
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<P: ArchiveProcessor> DataSource for ThreadedArchiveSource<P> {
    fn source(&self) -> &SourceBase {
        &self.source
    }

    fn source_mut(&mut self) -> &mut SourceBase {
        &mut self.source
    }

    fn mechanism(&self) -> Mechanism {
        Mechanism::Archive
    }

    fn start(&mut self) {
        let Some(mut processor) = self.processor.take() else {
            tracing::debug!("Archive source {} already started", self.uri);
            return;
        };

        let emitter = ArchiveEmitter {
            tx: self.tx.clone(),
            running: self.running.clone(),
        };
        let uri = self.uri.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("archive-{}", self.node.id().0))
            .spawn(move || {
                emitter.status(Status::Active);
                tracing::debug!("Reading archive {}", uri);
                let ok = processor.process(&uri, &emitter);
                if !ok {
                    tracing::warn!("Failed to read archive {}", uri);
                }
                emitter.status(if ok { Status::Stopped } else { Status::Invalid });
            });

        match spawned {
            Ok(handle) => {
                self.source.set_status(Status::Pending);
                self.worker = Some(handle);
            }
            Err(e) => {
                tracing::error!("Failed to spawn archive worker for {}: {}", self.uri, e);
                self.source.set_status(Status::Invalid);
            }
        }
    }
}

impl<P: ArchiveProcessor> Drop for ThreadedArchiveSource<P> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Archive worker for {} panicked", self.uri);
            }
        }
    }
}
