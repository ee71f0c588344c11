//! Topic, subscription and monitor support for Zaqar-style messaging services
//!
//! Requests are described declaratively in an operation registry (a base
//! queue schema merged with the pub/sub extension), built into concrete
//! [`operation::Request`]s and handed to a [`transport::Transport`].
//! Resource proxies ([`Queue`], [`Topic`], [`Subscription`]) sit on top and
//! manage lazy fetching, creation, metadata patches and monitor rows.
//!
//! ```no_run
//! use zaqar_pubsub::{Client, ConnectionSettings, Provision};
//!
//! # async fn demo() -> zaqar_pubsub::Result<()> {
//! let client = Client::connect(&ConnectionSettings::for_endpoint("http://localhost:8888"))?;
//! let mut topic = client.topic("orders", Provision::AutoCreate).await?;
//! let row = topic.monitor().await?;
//! println!("{row:?}");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod operation;
pub mod resource;
pub mod transport;

/// Version injected at compile time via ZAQAR_PUBSUB_VERSION (set by CI),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("ZAQAR_PUBSUB_VERSION") {
    Some(v) => v,
    None => "dev",
};

pub use client::{params, Client};
pub use config::{Config, ConnectionSettings, Overrides};
pub use error::{Error, Result};
pub use resource::{
    ListOptions, Message, Metadata, Provision, Queue, RemoteResource, Subscription, Topic,
};
pub use transport::{HttpTransport, Response, Transport};
