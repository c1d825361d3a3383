//! `assetpipe_core` is the core library for the assetpipe asset compiler. It
//! indexes one or more source directories, resolves an entry file by logical
//! name and type, and renders it through a [`Renderer`] that can pull in
//! sibling files, apply named filters and record the files it depends on.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Base directories
//!   → Index (walks each directory once: type → logical name → path)
//!   → Pipeline::process (claims the process-wide render slot)
//!   → Renderer (looks up files, marks them processed, registers dependencies)
//!   → Filters (named transformations on rendered content)
//!   → Rendered content + dependency fingerprint
//! ```
//!
//! A file's logical name and type come from splitting its path relative to
//! the base directory on the first `.` of the basename: `css/reset.css` has
//! the name `css/reset` and the type `css`. When two base directories contain
//! the same name and type, the later directory wins.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `assetpipe.toml`.
//! - [`index`]: The filesystem snapshot built when a pipeline is created.
//! - [`filters`]: The [`Filter`] trait and the [`FilterRegistry`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assetpipe_core::Pipeline;
//! use assetpipe_core::Vars;
//!
//! let mut pipeline = Pipeline::new(["assets", "vendor/assets"]).unwrap();
//! let css = pipeline.process("css", None, &Vars::new()).unwrap();
//!
//! // Store alongside the output; compare later to decide whether to rebuild.
//! let fingerprint = pipeline.dependencies_file_content().unwrap();
//! ```

pub use dependencies::*;
pub use error::*;
pub use filters::Filter;
pub use filters::FilterRegistry;
pub use filters::FilterRegistryBuilder;
pub use filters::Vars;
pub use guard::*;
pub use pipeline::*;
pub use renderer::*;

pub mod config;
mod dependencies;
#[allow(unused_assignments)]
mod error;
pub mod filters;
mod guard;
pub mod index;
mod pipeline;
mod renderer;

#[cfg(test)]
mod __fixtures;
