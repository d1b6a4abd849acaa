//! 内容层 - 内容记录、内容源接口与文本处理

pub mod record;
pub mod source;
pub mod text;

pub use record::{ContentRecord, ContentStatus, CATEGORY_TAXONOMY, TAG_TAXONOMY};
pub use source::{ContentFile, ContentSource, JsonContentSource, Term};
