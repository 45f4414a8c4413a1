pub mod client;
pub mod error;
pub mod models;

pub use client::{ApiClient, MessageTransport};
pub use error::ApiError;
pub use models::{CreateMessageRequest, FieldError, Message, MessageFilter};
