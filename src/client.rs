use crate::fetcher::NodeFetcher;
use crate::notify::{LogSink, NotificationService};
use crate::registry::{NodeRegistry, Presenter};
use crate::session::SessionController;
use crate::types::{Node, UiCommand};
use hyper::Uri;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5);
const NOTIFY_QUEUE_CAPACITY: usize = 16;

struct RowState {
    node: Node,
    visible: bool,
}

/// Thinnest possible stand-in for the GUI list: rows live in memory and
/// `draw` prints the visible ones. Handles are indexes into the row vec.
#[derive(Default)]
pub struct TermPresenter {
    rows: Vec<RowState>,
}

impl TermPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &Node> {
        self.rows.iter().filter(|r| r.visible).map(|r| &r.node)
    }

    pub fn draw(&self) {
        println!("--- Select a Node ---");
        for node in self.visible_rows() {
            println!(
                "  {:<6} {:<16} {:<16} {:>4} ms  {}",
                node.id, node.name, node.country, node.latency_ms, node.ip_address
            );
        }
    }
}

impl Presenter for TermPresenter {
    type Row = usize;

    fn clear(&mut self) {
        self.rows.clear();
    }

    fn push_row(&mut self, node: &Node) -> usize {
        self.rows.push(RowState {
            node: node.clone(),
            visible: true,
        });
        self.rows.len() - 1
    }

    fn set_latency(&mut self, row: &usize, latency_ms: u32) {
        if let Some(state) = self.rows.get_mut(*row) {
            state.node.latency_ms = latency_ms;
        }
    }

    fn set_visible(&mut self, row: &usize, visible: bool) {
        if let Some(state) = self.rows.get_mut(*row) {
            state.visible = visible;
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum CommandOutcome {
    Continue,
    /// Caller arms the handshake timer for this long.
    StartConnect(Duration),
    Quit,
}

fn handle_command(
    command: UiCommand,
    registry: &mut NodeRegistry<TermPresenter>,
    session: &mut SessionController,
    notifier: &NotificationService,
) -> CommandOutcome {
    match command {
        UiCommand::Sort(key) => {
            registry.sort_by(key);
            registry.presenter().draw();
        }
        UiCommand::Filter(text) => {
            registry.apply_filter(&text);
            registry.presenter().draw();
        }
        UiCommand::Connect(id) => match registry.get(&id).cloned() {
            Some(node) => match session.begin_connect(node.clone()) {
                Ok(delay) => {
                    info!("Connecting to {}...", node.name);
                    notifier.send("Vantage VPN", &format!("Connecting to {}...", node.name));
                    return CommandOutcome::StartConnect(delay);
                }
                Err(e) => warn!("{}", e),
            },
            None => warn!("No node with id '{}'", id),
        },
        UiCommand::Disconnect => match session.disconnect() {
            Ok(node) => {
                info!("Disconnected");
                notifier.send("Vantage VPN", &format!("Disconnected from {}", node.name));
            }
            Err(e) => warn!("{}", e),
        },
        UiCommand::Quit => return CommandOutcome::Quit,
    }
    CommandOutcome::Continue
}

/// The client: sign in, poll the node API, and drive the session state
/// machine from stdin commands until quit or shutdown.
pub async fn run(
    endpoint: Uri,
    email: &str,
    password: &str,
    shutdown_notify: Arc<Notify>,
) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = NodeFetcher::new(endpoint);
    let mut registry = NodeRegistry::new(TermPresenter::new());
    let mut session = SessionController::new();
    let notifier = NotificationService::spawn(LogSink, NOTIFY_QUEUE_CAPACITY);

    // Mock sign-in screen: one literal credential check.
    if let Err(e) = session.sign_in(email, password) {
        error!("{}", e);
        notifier.shutdown().await;
        return Err(e.into());
    }
    info!("Signed in as {}", email);

    if registry.load(fetcher.fetch().await) {
        registry.presenter().draw();
    } else {
        warn!("Could not fetch nodes.");
    }
    info!("Commands: sort ping|country, filter <text>, connect <id>, disconnect, quit");

    let mut refresh = time::interval_at(Instant::now() + REFRESH_INTERVAL, REFRESH_INTERVAL);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut second = time::interval(Duration::from_secs(1));
    second.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // One-shot timer standing in for the connect handshake.
    let connect_timer = time::sleep(Duration::ZERO);
    tokio::pin!(connect_timer);
    let mut connecting = false;

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                let fresh = fetcher.fetch().await;
                if registry.is_empty() {
                    // First load failed; a later successful poll populates it.
                    if registry.load(fresh) {
                        registry.presenter().draw();
                    }
                } else {
                    registry.refresh(fresh);
                }
            }

            _ = second.tick() => {
                if let Some(stats) = session.tick() {
                    info!(
                        "Duration: {}  Download: {:.2} Mbps  Upload: {:.2} Mbps",
                        stats.duration_display(),
                        stats.download_mbps,
                        stats.upload_mbps
                    );
                }
            }

            _ = &mut connect_timer, if connecting => {
                connecting = false;
                match session.complete_connect() {
                    Ok(node) => {
                        info!("You are securely connected");
                        info!("Server: {} ({})", node.name, node.country);
                        info!("IP Address: {}", node.ip_address);
                        notifier.send("Vantage VPN", &format!("Connected to {}", node.name));
                    }
                    Err(e) => error!("{}", e),
                }
            }

            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Input closed");
                        break;
                    }
                    Err(e) => {
                        error!("Input error: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                match UiCommand::parse(&line) {
                    Ok(command) => {
                        match handle_command(command, &mut registry, &mut session, &notifier) {
                            CommandOutcome::Continue => {}
                            CommandOutcome::StartConnect(delay) => {
                                connecting = true;
                                connect_timer.as_mut().reset(Instant::now() + delay);
                            }
                            CommandOutcome::Quit => break,
                        }
                    }
                    Err(usage) => warn!("{}", usage),
                }
            }

            _ = shutdown_notify.notified() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    notifier.shutdown().await;
    Ok(())
}
