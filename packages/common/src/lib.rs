pub mod record;
pub mod storage;

pub use record::{Attachment, Metadata, Record};
