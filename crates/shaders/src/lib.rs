//! Shader source registry: fetch shader text by name from one origin, cache
//! it, and hand it out synchronously afterwards.
//!
//! # Invariants
//! - A name is present only after a successful load; lookups never fetch.
//! - A failed load never changes the cached entry for its name.
//! - At most one load per name is in flight; a second one is rejected.
//!
//! Nothing here parses or validates shader code. The text is handed to the
//! GPU layer as-is.

pub mod builtin;
mod error;
mod fetch;
mod registry;

pub use error::{FetchError, ShaderError};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::{AnyFetcher, FsFetcher, MemoryFetcher, SourceFetcher, join_location};
pub use registry::{ShaderEntry, ShaderRegistry};

pub fn crate_info() -> &'static str {
    "rainglass-shaders v0.1.0"
}
