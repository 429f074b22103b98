pub mod tree;

pub use tree::{Cursor, ViewFlags, ViewId, ViewKind, ViewTree};
