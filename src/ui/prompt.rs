use chatline::{ChatSync, CreateMessageRequest};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::ui::chat_view::{Command, parse_command};

/// Reads commands until `/quit` or end of input. Reloads and sends run as
/// their own tasks so the prompt stays responsive while they are pending.
///
/// Returns the message that last failed to send, if it was never retried.
pub async fn run<R>(sync: ChatSync, author: String, input: R) -> Option<CreateMessageRequest>
where
    R: AsyncBufRead + Unpin,
{
    let (failed_tx, mut failed_rx) = mpsc::unbounded_channel::<CreateMessageRequest>();
    // Last unsent message, kept until it goes through.
    let mut draft: Option<CreateMessageRequest> = None;
    let mut lines = input.lines();

    loop {
        let line = tokio::select! {
            biased;
            Some(request) = failed_rx.recv() => {
                draft = Some(request);
                continue;
            }
            line = lines.next_line() => line,
        };
        let Ok(Some(line)) = line else { break };

        let request = match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Reload => {
                let core = sync.clone();
                tokio::spawn(async move { core.reload().await });
                continue;
            }
            Command::Retry => match draft.take() {
                Some(request) => request,
                None => continue,
            },
            Command::Send(text) => CreateMessageRequest::new(author.clone(), text),
        };

        let core = sync.clone();
        let failed = failed_tx.clone();
        tokio::spawn(async move {
            if !core.send_message(&request).await {
                let _ = failed.send(request);
            }
        });
    }

    while let Ok(request) = failed_rx.try_recv() {
        draft = Some(request);
    }
    draft
}
