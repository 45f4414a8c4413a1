//! REST chat client core: a bearer-authenticated message transport, and a
//! sync core that keeps an ordered, deduplicated message collection with
//! independent load and send lifecycles.

pub mod api;
pub mod app;
pub mod sync;
pub mod utils;

pub use api::{ApiClient, ApiError, CreateMessageRequest, Message, MessageFilter, MessageTransport};
pub use app::{AppConfig, ConfigError};
pub use sync::{AsyncStatus, ChatSnapshot, ChatSync, DisplayMessage};
