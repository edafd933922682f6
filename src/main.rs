mod app;
mod components;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::feed::{FeedHandle, FeedLauncher, FeedMessage};
use crate::state::messages::{Command, MountRequest, NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crate::state::ticker::Ticker;
use campus_api::client::GatewayClient;
use campus_api::credentials::SessionCredentials;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::error;
use std::io::Stdout;
use std::sync::Arc;
use std::time::Instant;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal();

    tui_logger::init_logger(log::LevelFilter::Info)?;
    tui_logger::set_default_level(log::LevelFilter::Info);

    let app = App::new();
    let credentials = Arc::new(SessionCredentials::new(
        app.settings.api_key.clone(),
        app.settings.token.clone(),
    ));
    let client = GatewayClient::new(app.settings.api_url.clone(), credentials.clone());
    let (ws_url, ws_retries) = (app.settings.ws_url.clone(), app.settings.ws_retries);
    let app = Arc::new(Mutex::new(app));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);
    let (feed_tx, feed_rx) = mpsc::channel::<FeedMessage>(256);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(client, credentials, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Notification expiry
    let ticker = Ticker::new(ui_event_tx.clone());
    let ticker_task = tokio::spawn(ticker.run());

    // Feeds are opened per mounted view from the UI loop
    let launcher = FeedLauncher { url: ws_url, max_retries: ws_retries, events: feed_tx };

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, network_req_tx, network_resp_rx, launcher, feed_rx).await;

    input_handler.abort();
    network_task.abort();
    ticker_task.abort();

    Ok(())
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("campus-scores {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "campus-scores - live intramural scoreboard for the terminal

Usage:
  campus-scores
  campus-scores --help
  campus-scores --version

Environment:
  CAMPUS_API_URL      Gateway base URL (default http://127.0.0.1:8080/api)
  CAMPUS_WS_URL       Live feed WebSocket URL (default ws://127.0.0.1:8788)
  CAMPUS_WS_RETRIES   Feed reconnect attempts before giving up (default 5)
  CAMPUS_API_KEY      Read key sent with every request
  CAMPUS_TOKEN        Pre-issued bearer token for writes
  CAMPUS_USERNAME     Login on startup (with CAMPUS_PASSWORD)
  CAMPUS_PASSWORD
  CAMPUS_LOG          Log level: error, warn, info, debug, trace"
}

/// Everything the UI loop owns besides the app itself.
struct Plumbing {
    network_requests: mpsc::Sender<NetworkRequest>,
    launcher: FeedLauncher,
    /// Feed for the mounted view. Replacing it closes the previous one.
    feed: Option<FeedHandle>,
}

impl Plumbing {
    async fn run(&mut self, command: Command) {
        match command {
            Command::Mount(mount) => self.mount(mount).await,
            Command::Network(request) => self.send(request).await,
        }
    }

    async fn mount(&mut self, MountRequest { generation, kinds }: MountRequest) {
        self.feed = Some(self.launcher.launch(generation));
        self.send(NetworkRequest::LoadSnapshot { generation, kinds }).await;
    }

    async fn send(&self, request: NetworkRequest) {
        if self.network_requests.send(request).await.is_err() {
            error!("network worker has stopped");
        }
    }
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    launcher: FeedLauncher,
    mut feed_events: mpsc::Receiver<FeedMessage>,
) {
    let mut loading = LoadingState::default();
    let mut plumbing = Plumbing { network_requests, launcher, feed: None };

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &mut plumbing).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &plumbing, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(message) = feed_events.recv() => {
                let should_redraw = handle_feed_message(message, &app, &plumbing).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }
        }
    }
}

async fn handle_ui_event(ui_event: UiEvent, app: &Arc<Mutex<App>>, plumbing: &mut Plumbing) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let (login, mount) = app.lock().await.start();
            if let Some(request) = login {
                plumbing.send(request).await;
            }
            if let Some(mount) = mount {
                plumbing.mount(mount).await;
            }
            true
        }
        UiEvent::KeyPressed(key_event) => {
            if let Some(command) = keys::handle_key_bindings(key_event, app).await {
                plumbing.run(command).await;
            }
            true
        }
        UiEvent::Resize => true,
        UiEvent::Tick => app.lock().await.on_tick(Instant::now()),
    }
}

async fn handle_feed_message(message: FeedMessage, app: &Arc<Mutex<App>>, plumbing: &Plumbing) -> bool {
    if plumbing.feed.as_ref().is_none_or(|f| f.generation() != message.generation) {
        return false;
    }
    let refetch = app.lock().await.on_feed_message(message);
    if let Some(request) = refetch {
        plumbing.send(request).await;
    }
    true
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    plumbing: &Plumbing,
    loading: &mut LoadingState,
) -> bool {
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::LoggedIn { session } => {
            app.lock().await.on_logged_in(session);
        }
        NetworkResponse::SnapshotLoaded { generation, snapshot } => {
            let refetch = app.lock().await.on_snapshot_loaded(generation, snapshot);
            if let Some(request) = refetch {
                plumbing.send(request).await;
            }
        }
        NetworkResponse::SnapshotFailed { generation, message } => {
            app.lock().await.on_snapshot_failed(generation, message);
        }
        NetworkResponse::WriteCompleted { message } => {
            app.lock().await.on_write_completed(message);
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            app.lock().await.on_error(message);
        }
    }
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::Hide);
    let _ = execute!(stdout, terminal::EnterAlternateScreen);
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = terminal::enable_raw_mode();
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
