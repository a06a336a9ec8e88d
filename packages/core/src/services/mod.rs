//! Business Services
//!
//! - `TreeService` - hierarchical node operations over a `NodeStore`
//! - `seed` - the demo animal taxonomy

mod error;
pub mod seed;
mod tree_service;

pub use error::TreeServiceError;
pub use seed::{animal_taxonomy, ANIMAL_TAXONOMY};
pub use tree_service::TreeService;
