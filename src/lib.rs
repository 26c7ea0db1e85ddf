//! tabulon - a runtime-schema dynamic table engine
//!
//! Users define tables with arbitrary per-column typed schemas at runtime,
//! populate them through CRUD and bulk import, and extend the available
//! column types through installable modules. Writes against "for sale"
//! tables also append to an immutable inventory ledger.

pub mod coercion;
pub mod errors;
pub mod filter;
pub mod inventory;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod purchase;
pub mod registry;
pub mod schema_manager;
pub mod store;

pub use errors::{EngineError, EngineResult, FieldError, StatusCategory};
