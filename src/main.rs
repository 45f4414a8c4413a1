mod ui;

use std::process::ExitCode;

use chatline::{ApiClient, AppConfig, ChatSync};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use crate::ui::{chat_view, prompt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("chatline: {e}");
            return ExitCode::FAILURE;
        }
    };
    let client = match ApiClient::new(config.base_url.clone(), config.token.clone()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("chatline: {e}");
            return ExitCode::FAILURE;
        }
    };

    let sync = ChatSync::with_page_size(client, config.page_size);
    let view = tokio::spawn(chat_view::run(sync.subscribe()));
    let sync = sync.start();

    let stdin = BufReader::new(tokio::io::stdin());
    if let Some(draft) = prompt::run(sync.clone(), config.author.clone(), stdin).await {
        eprintln!("chatline: unsent message dropped: {}", draft.message);
    }

    sync.close();
    view.abort();
    ExitCode::SUCCESS
}
