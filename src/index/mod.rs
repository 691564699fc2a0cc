//! On-disk B-tree directory: key lookup and key-range enumeration.

mod node;
mod tree;

pub use tree::DirectoryIndex;
