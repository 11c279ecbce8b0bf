//! # visgui-data: Node-Based Data Distribution
//!
//! A single-threaded framework for moving time-indexed data from producers
//! (data sources) to consumers (views, readers) through a tree of nodes, plus
//! an interactive query refinement (IQR) session built on the same node model.
//!
//! ## Architecture
//!
//! - **Event loop**: A cooperative scheduler owned by the application thread.
//!   Worker threads hand data back through [`Marshaller`]s; everything else
//!   runs as loop tasks.
//! - **Nodes**: Reference-counted tree members. Consumers [`connect`] to get a
//!   [`NodeProxy`], then `enter`/`leave` to signal interest. A node builds its
//!   expensive state only while someone is interested.
//! - **Selectors**: Typed filters bundled in a copy-on-write [`SelectorSet`]
//!   and sent with each update request.
//! - **Sources**: Nodes that produce data through typed interfaces. Status
//!   moves from `Unstarted` to a terminal `Stopped` or `Invalid`.
//! - **Readers**: Run a source to completion and collect what it emitted.
//! - **Query**: [`QuerySessionNode`] drives execute / feedback / refine rounds
//!   against a pluggable [`QueryBackend`].
//!
//! ## Configuration
//!
//! Tunables live in [`FrameworkConfig`], stored as TOML in the platform config
//! directory under `org.visgui.data`.
//!
//! ## Example
//!
//! ```ignore
//! use visgui_data::{
//!     config::FrameworkConfig,
//!     event_loop::EventLoop,
//!     reader::{DataReader, TrackReader},
//! };
//!
//! let config = FrameworkConfig::load_or_default();
//! let _guard = visgui_data::logging::init(&config.logging)?;
//! let ev = EventLoop::with_config(config.event_loop.clone());
//!
//! let source = open_archive(&ev, "file:///data/tracks.kw18");
//! let mut reader = TrackReader::new(&ev);
//! reader.set_source(Some(source));
//! if reader.exec() {
//!     for track in reader.tracks().iter() {
//!         println!("{:?}: {} states", track.id, track.states.len());
//!     }
//! }
//! ```
//!
//! [`connect`]: node::NodeRefExt::connect

pub mod config;
pub mod error;
pub mod event_loop;
pub mod logging;
pub mod node;
pub mod query;
pub mod reader;
pub mod selector;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use config::FrameworkConfig;
pub use error::{DataFrameworkError, Result};
pub use event_loop::{EventLoop, Marshaller, Notifier};
pub use node::{Node, NodeProxy, NodeRef, NodeRefExt};
pub use query::{QueryBackend, QueryService, QuerySessionNode};
pub use selector::{Selector, SelectorSet};
pub use source::{DataSource, SourceRef, Status};
pub use types::{StatusSource, TimeStamp, UpdateFlags};
