//! In-memory directory backend for Strata.
//!
//! This crate provides an in-memory implementation of the directory and
//! audit sink traits from `strata-auth`, behind a `tokio` `RwLock`.
//!
//! # Example
//!
//! ```ignore
//! use strata_db_memory::{DirectorySeed, MemoryDirectory};
//!
//! let directory = MemoryDirectory::from_seed(
//!     DirectorySeed::default_catalog().user(User::builder("1", "alice").role("staff").build()),
//! );
//!
//! let tx = directory.begin();
//! // ... run guarded operations against `tx` ...
//! tx.commit().await?;
//! ```

pub mod seed;
pub mod storage;
pub mod transaction;

pub use seed::DirectorySeed;
pub use storage::MemoryDirectory;
pub use transaction::MemoryTransaction;
