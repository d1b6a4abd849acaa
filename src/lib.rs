//! Social Auto Share - 内容发布时自动分享到社交渠道

pub mod cli;
pub mod content;
pub mod settings;
pub mod share;

pub use content::{ContentRecord, ContentSource, ContentStatus, JsonContentSource, Term};
pub use settings::{ScopedSettings, ShareSettings};
pub use share::{
    AutoShare, AutoShareBuilder, ContentPayload, ContentType, Destination, DispatchOutcome,
    DispatchReport, PayloadExtension, PostContentType, PublishEvent, Rejection, SendResult,
    ShareDispatcher, TelegramDestination, Transport, TransportResponse, ValidationWarning,
};
