mod app;
mod handler;
mod tui;
mod ui;

use anyhow::Result;
use auditor_core::{logging, Config, Relay};
use tracing::info;

use app::App;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials and endpoint are resolved once, before the UI starts
    let config = Config::resolve()?;
    let log_path = logging::init(&config)?;
    info!(
        endpoint = %config.endpoint,
        model = %config.model,
        mode = config.mode.as_str(),
        log = ?log_path,
        "starting auditor"
    );

    let relay = Relay::from_config(&config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(relay, events.sender());
    app.mode = config.mode;

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    info!("auditor exited");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}
