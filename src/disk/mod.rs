pub mod file;
pub(crate) mod record;

pub use file::{DiskTrie, Iter};
