use chatline::{ApiError, AsyncStatus, ChatSnapshot, DisplayMessage};
use chrono::DateTime;
use tokio::sync::watch;

/// What a line typed at the prompt means.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Reload,
    Retry,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Command {
    let text = line.trim();
    match text {
        "" => Command::Empty,
        "/reload" => Command::Reload,
        "/retry" => Command::Retry,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Send(text.to_string()),
    }
}

const REDRAW_MARKER: &str = "── history updated ──";

/// Terminal rendering of the chat snapshot. New messages that extend what
/// is already on screen are appended; any other change (an older message
/// arriving late, an entry replaced under its id) redraws the whole list in
/// time order. Lifecycle changes are printed as they happen.
#[derive(Default)]
pub struct ChatView {
    shown: Vec<DisplayMessage>,
    load: AsyncStatus,
    send: AsyncStatus,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, snap: &ChatSnapshot) -> Vec<String> {
        let mut lines = Vec::new();

        if snap.load_status() != self.load {
            self.load = snap.load_status();
            match (self.load, snap.load_error()) {
                (AsyncStatus::Loading, _) => lines.push("… loading messages".to_string()),
                (AsyncStatus::Error, Some(err)) => {
                    lines.push(format!("! could not load messages: {} (/reload to retry)", describe(err)))
                }
                _ => {}
            }
        }

        let extends = snap.messages.starts_with(&self.shown);
        let fresh = if extends { &snap.messages[self.shown.len()..] } else { &snap.messages[..] };
        if !extends {
            lines.push(REDRAW_MARKER.to_string());
        }
        lines.extend(fresh.iter().map(format_message));
        if !fresh.is_empty() || !extends {
            self.shown = snap.messages.clone();
        }

        if snap.send_status() != self.send {
            self.send = snap.send_status();
            if let (AsyncStatus::Error, Some(err)) = (self.send, snap.send_error()) {
                lines.push(format!("! message not sent: {} (/retry to resend)", describe(err)));
            }
        }

        lines
    }
}

fn format_message(message: &DisplayMessage) -> String {
    let time = DateTime::from_timestamp_millis(message.created_at_ms())
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    format!("[{time}] {}: {}", message.author(), message.message())
}

fn describe(err: &ApiError) -> String {
    if let Some(reason) = err.field_error("message") {
        return reason.to_string();
    }
    match err {
        ApiError::Network { message, .. } => message.clone(),
        _ => format!("{} ({})", err.message(), err.status()),
    }
}

/// Prints every committed change until the core goes away.
pub async fn run(mut rx: watch::Receiver<ChatSnapshot>) {
    let mut view = ChatView::new();
    loop {
        let lines = view.render(&rx.borrow_and_update());
        for line in lines {
            println!("{line}");
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}
