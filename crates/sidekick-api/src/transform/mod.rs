//! Late, narrowly scoped model rewrites.
//!
//! All transformations take a cross-referenced [`crate::Model`] and run in
//! this order before codec annotation:
//!
//! 1. [`skip_model_elements`] prunes the model to an include list or
//!    removes a skip list;
//! 2. [`patch_documentation`] replaces literal documentation text;
//! 3. [`update_method_pagination`] detects AIP-4233 pagination and applies
//!    item-field overrides;
//! 4. [`auto_populate`] marks AIP-4235 request ID fields.

mod autopopulate;
mod documentation;
mod pagination;
mod skip;

pub use autopopulate::auto_populate;
pub use documentation::patch_documentation;
pub use pagination::update_method_pagination;
pub use skip::{find_dependencies, skip_model_elements};
