//! Request handling building blocks
//!
//! - [`features`]: the query-feature pipeline turning a query string into a
//!   staged list query
//! - [`factory`]: the generic CRUD operations every resource reuses
//! - [`envelope`]: the uniform success/failure response body

pub mod envelope;
pub mod factory;
pub mod features;

pub use envelope::{Envelope, Status};
pub use features::{QueryFeatures, QueryParams, DEFAULT_LIMIT, MAX_LIMIT};
