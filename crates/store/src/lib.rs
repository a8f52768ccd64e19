//! Topic repository infrastructure adapters.
//!
//! Implements the [`pipeline::TopicRepository`] port twice:
//!
//! - [`JsonFileRepository`] — the two JSON documents (`topics.json`,
//!   `published.json`) on the local file system. Absent documents are created
//!   on open: the catalog with [`pipeline::TopicCatalog::seeded`], the ledger
//!   empty. Existing documents are never overwritten by initialisation.
//! - [`MemoryRepository`] — both documents held in memory, for tests and
//!   dry runs against scratch state.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** File paths, serialisation, and write-replace semantics
//! live here. The [`pipeline`] crate sees only [`pipeline::TopicRepository`].
//!
//! Documents are read and written whole without locking; two pipeline runs
//! sharing the same files can lose each other's updates.

mod json_file;
mod memory;

pub use json_file::JsonFileRepository;
pub use memory::MemoryRepository;
