//! Compiled units and the unit cache.
//!
//! A *unit* is one parsed source file with its `include`d files spliced in.
//! Units are shared as `Arc<CompiledUnit>` and replaced wholesale when the
//! file (or one of its includes) changes on disk.
//!
//! ```text
//! UnitCache::load_root(path)
//!   └── evaluate(path)             stat → fresh? → read + parse + splice includes
//!         └── handle_dependencies  walk `use` targets, promote relative spellings,
//!               └── evaluate(dep)  ... recursively, cycles cut by `resolving` markers
//! ```
//!
//! The parser, the filesystem and the library search path are collaborators
//! expressed as [`SourceParser`], [`FileSystem`] and [`SearchPath`].
//! The evaluator only ever reads the cache through [`UnitSource`].

mod cache;
mod errors;
mod fs;
mod parse;
pub mod testing;
mod unit;

pub use cache::{CacheEntry, Evaluated, NoUnits, UnitCache, UnitSource, UseTarget};
pub use errors::UnitError;
pub use fs::{normalize, FileSystem, SearchPath, StdFileSystem, LIBRARY_PATH_VAR};
pub use parse::{IncludeDirective, ParseError, ParsedSource, SourceParser};
pub use unit::{CompiledUnit, UnitBuilder};
