//! # docbridge - Document Database Client
//!
//! docbridge is a backend-agnostic client for document databases. It turns
//! abstract query descriptions into store calls, maps documents to typed
//! records and exposes both request/response and live streaming access.
//!
//! ## Key Features
//!
//! - **Typed records**: any serde type with an `_id` field is a document
//! - **Query normalization**: one condition or one ordering, plus a limit
//! - **Live subscriptions**: result sets pushed as `futures::Stream`s
//! - **Pluggable stores**: anything implementing [store::DocumentStoreProvider]
//! - **In-memory store**: an emulator stand-in for development and tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docbridge::client::DatabaseClient;
//! use docbridge::query::{field, QueryOptions};
//! use docbridge::reference::Endpoint;
//! use docbridge::store::StoreTarget;
//!
//! # async fn run() -> docbridge::errors::DbResult<()> {
//! let client = DatabaseClient::builder()
//!     .target(StoreTarget::for_site("emulated_site", "community-platform"))
//!     .build()?;
//!
//! let profiles = Endpoint::new("profiles")?;
//! client.set_doc(&profiles, &serde_json::json!({"_id": "p1", "verified": true})).await?;
//!
//! let verified: Vec<serde_json::Value> = client
//!     .query_collection(&profiles, &QueryOptions::filtered(field("verified").eq(true)))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - The client and its nine access operations
//! - [`client_builder`] - Client builder
//! - [`client_config`] - Client configuration
//! - [`common`] - Shared types, constants and helpers
//! - [`document`] - Document model and the [`doc!`] macro
//! - [`errors`] - Error types and result definitions
//! - [`query`] - Query descriptions and their normalization
//! - [`reference`] - Endpoints and store references
//! - [`store`] - Store contract and the in-memory store
//! - [`subscription`] - Live snapshot streams

pub mod client;
pub mod client_builder;
pub mod client_config;
pub mod common;
pub mod document;
pub mod errors;
pub mod query;
pub mod reference;
pub mod store;
pub mod subscription;

#[doc(hidden)]
pub use serde_json::json as __json;
#[doc(hidden)]
pub use serde_json::Value as __JsonValue;
