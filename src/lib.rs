mod srst;
pub use srst::*;
pub mod structs;
pub mod writer;

pub use structs::{platform_name, Platform};
pub use writer::{EntrySource, SrstBuilder};
