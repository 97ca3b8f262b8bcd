//! Configuration tree and nested key resolution.
//!
//! # Data Flow
//! ```text
//! "db.primary.port"
//!     → key.rs splits on '.' into ["db", "primary", "port"]
//!     → read path: walk tables, absent on a missing segment or a leaf
//!     → write path: walk tables, creating missing ones, fail on a leaf
//!     → node.rs Table holding the final segment
//! ```
//!
//! # Design Decisions
//! - Leaves are always strings; typing happens in the convert subsystem
//! - No escaping: a literal '.' inside a segment cannot be addressed
//! - Writes never overwrite an intermediate leaf (InvalidPath instead)

pub mod key;
pub mod node;

pub use key::NestedKey;
pub use node::{ConfigNode, Table};
