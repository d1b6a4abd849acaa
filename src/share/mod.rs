//! 分享流水线 - 发布事件 -> 资格过滤 -> payload -> 各渠道
//!
//! # 设计目标
//! 1. 统一接口：所有渠道实现 `Destination` trait，所有内容类型实现 `ContentType` trait
//! 2. 渠道隔离：单个渠道失败（包括 panic）不影响其他渠道
//! 3. 单一快照：payload 只构建一次，所有渠道收到相同的数据
//!
//! # 使用示例
//! ```ignore
//! use social_auto_share::{AutoShare, JsonContentSource, ShareSettings};
//!
//! let settings = ShareSettings::load(&ShareSettings::default_path())?;
//! let source = Arc::new(JsonContentSource::load(&JsonContentSource::default_path())?);
//! let share = AutoShare::builder(settings, source).build()?;
//!
//! let outcome = share.on_publish("42");
//! ```

pub mod content_type;
pub mod destination;
pub mod destinations;
pub mod dispatcher;
pub mod eligibility;
pub mod formatter;
pub mod payload;
pub mod plugin;
pub mod transport;

pub use content_type::{ContentType, PostContentType, PublishEvent};
pub use destination::{Destination, SendResult, ValidationWarning};
pub use destinations::{ParseMode, TelegramConfig, TelegramDestination};
pub use dispatcher::{DispatchOutcome, DispatchReport, ShareDispatcher};
pub use eligibility::{check_eligibility, EligibilityRules, Rejection};
pub use formatter::MessageFormatter;
pub use payload::{ContentPayload, PayloadBuilder, PayloadExtension};
pub use plugin::{validate_scope, AutoShare, AutoShareBuilder};
pub use transport::{HttpTransport, Transport, TransportResponse};
