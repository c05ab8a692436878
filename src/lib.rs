//! Client-side data model and API wrapper for a project tracker's story
//! resource.
//!
//! The heart of the crate is [`Story`]: a work item whose fields carry
//! tri-state semantics ([`FieldState`]: absent, explicitly empty, or
//! valued). A record built from scratch and partially filled in serializes
//! to a payload containing only the touched fields, so an update never
//! clobbers server-side state the caller did not mean to change. Labels,
//! the one field the wire replaces wholesale, keep their documented
//! fetch-before-mutate caveat.
//!
//! [`TrackerClient`] is the thin transport on top: token-header
//! authentication and the project-scoped story endpoints, one request per
//! call.
//!
//! ```no_run
//! use tracker_client::{Story, StoryType, TrackerClient};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let client = TrackerClient::new(1234, "your-api-token");
//!
//! // Fetch, mutate, write back. Only the touched fields go over the wire.
//! let mut story = client.get_story(5678).await?;
//! story.set_current_state("finished");
//! story.add_label("shipped");
//! client.update_story(&story).await?;
//!
//! // Or patch a story without fetching it first (labels excepted).
//! let mut patch = Story::new();
//! patch.set_story_type(StoryType::Bug);
//! patch.set_name("Renamed");
//! client.update_story_by_id(5678, &patch).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod wire;

pub use client::{TrackerClient, DEFAULT_BASE_API_URL};
pub use config::{load_config, AppConfig, TrackerConfig};
pub use error::TrackerError;
pub use model::field::FieldState;
pub use model::story::{Story, StoryType};
pub use wire::{Encoding, WirePayload, WireValue};
