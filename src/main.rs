use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::error;
use vantage::{client, handlers};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    /// Node API endpoint polled by the client
    #[arg(long, default_value = "http://127.0.0.1:5001/api/v1/nodes")]
    api_url: String,

    /// Email for the mock credential check
    #[arg(long, default_value = "test@test.com")]
    email: String,

    /// Password for the mock credential check
    #[arg(long, default_value = "password")]
    password: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the mock node API the client polls
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value = "5001")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let shutdown_notify = Arc::new(tokio::sync::Notify::new());
    tokio::spawn({
        let interrupt_handle = shutdown_notify.clone();
        async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            interrupt_handle.notify_waiters();
        }
    });

    match &args.command {
        Some(Command::Serve { host, port }) => {
            let listener = TcpListener::bind((host.as_str(), *port)).await?;
            handlers::serve(listener, shutdown_notify).await;
        }
        None => {
            let endpoint = args.api_url.parse::<hyper::Uri>()?;
            client::run(endpoint, &args.email, &args.password, shutdown_notify).await?;
        }
    }

    Ok(())
}
