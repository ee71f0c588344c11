//! Operation layer
//!
//! Remote calls are addressed by name, never by URL. Each name maps to a
//! [`Descriptor`] loaded from the JSON tables under `src/schema/`:
//!
//! - `v2.json` - base queue and message operations
//! - `pubsub.json` - topics, subscriptions, monitors and overrides
//!
//! The extension table is merged over the base table once, at first use,
//! and the result is never mutated afterwards.
//!
//! # Architecture
//!
//! - [`registry`] - descriptor types and the merged, process-wide table
//! - [`request`] - turns a descriptor plus parameters into a [`Request`]

pub mod registry;
pub mod request;

pub use registry::{registry, Descriptor, Method, OperationRegistry, ParamDef, ParamType};
pub use request::{build, ContentType, Params, Request};
