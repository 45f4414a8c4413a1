use crate::api::error::ApiError;
use crate::sync::normalize::DisplayMessage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AsyncStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Status of one lifecycle (load or send) plus the error that ended it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationState {
    pub status: AsyncStatus,
    pub error: Option<ApiError>,
}

impl OperationState {
    pub(crate) fn start(&mut self) {
        self.status = AsyncStatus::Loading;
        self.error = None;
    }

    pub(crate) fn succeed(&mut self) {
        self.status = AsyncStatus::Success;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: ApiError) {
        self.status = AsyncStatus::Error;
        self.error = Some(error);
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSnapshot {
    /// Ascending by creation time, ids unique.
    pub messages: Vec<DisplayMessage>,
    pub load: OperationState,
    pub send: OperationState,
}

impl ChatSnapshot {
    pub fn load_status(&self) -> AsyncStatus {
        self.load.status
    }

    pub fn load_error(&self) -> Option<&ApiError> {
        self.load.error.as_ref()
    }

    pub fn send_status(&self) -> AsyncStatus {
        self.send.status
    }

    pub fn send_error(&self) -> Option<&ApiError> {
        self.send.error.as_ref()
    }
}
