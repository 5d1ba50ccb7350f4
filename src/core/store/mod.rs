//! Intermediate on-disk store shared by the export and import phases
//!
//! - [`layout`]: where each entity is written
//! - [`files`]: JSON/Markdown record I/O

pub mod files;
pub mod layout;

pub use files::{read_files_from_dir, write_bytes, write_json, StoredFile, DEFAULT_MAX_FILES};
pub use layout::StoreLayout;
