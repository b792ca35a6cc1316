//! Book lending ledger backend.
//!
//! Hexagonal layout: [`domain`] holds the ledger rules and ports, [`inbound`]
//! the HTTP adapter, [`outbound`] the storage and hashing adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
