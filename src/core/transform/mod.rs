//! Data transformation logic
//!
//! - [`markup`]: Trac wiki markup to Markdown
//! - [`normalize`]: time and number normalization of XML-RPC values

pub mod markup;
pub mod normalize;

pub use markup::convert;
pub use normalize::{normalize_int, normalize_required_time, normalize_time, to_attribute_value};
