pub mod builtin;
pub mod error;
pub mod registry;

pub use builtin::{EPA_SET, LAKES_SET, SPRINGS_SET, WELLS_SET};
pub use error::CatalogError;
pub use registry::Catalog;
