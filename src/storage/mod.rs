//! Storage abstractions for the on-disk archive.
//!
//! The cache directory lives next to the assembled documents:
//!
//! ```text
//! {save_directory}/
//! ├── questions/            # Assembled problem pages + images/ + videos/
//! ├── cards/                # Explore card trees
//! ├── companies/            # Company favorite buckets
//! ├── submissions/          # Exported submission code
//! └── cache/                # API response cache (this module)
//! ```

pub mod cache;

// Re-export for convenience
pub use cache::{DiskCache, EntryInfo};
