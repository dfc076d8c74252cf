pub mod config;
pub mod domain;
pub mod errors;
pub mod session;
pub mod shaping;

pub use domain::channel::Channel;
pub use domain::context::ConversationContext;
pub use domain::message::{MessageInput, MessageRequest};
pub use domain::reply::{Intent, Output, OutputText, ServiceReply, ShapedResponse};
pub use errors::{ProviderBody, RelayError, UpstreamError};
pub use session::SessionRelay;
pub use shaping::shape;
