mod single_instance;

use anyhow::{Context, Result};
use clap::Parser;
use single_instance::InstanceLock;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::time::MissedTickBehavior;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vrcnp_blacklist::WorldBlacklist;
use vrcnp_core::config::{load_config, resolve_config_path, write_default_config};
use vrcnp_core::{AllowAll, BlacklistOracle, MediaInfoProvider, Source, Ticker, TICK_INTERVAL};
use vrcnp_osc::{UdpChatbox, DEFAULT_OSC_TARGET};

/// Used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "info,vrcnp=debug";

/// Show what you're listening to in your VRChat chatbox
#[derive(Parser, Debug)]
#[command(name = "vrcnp", version, about)]
struct Args {
    /// Config file (default: Config.toml beside the executable, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to send OSC messages
    #[arg(long, default_value = DEFAULT_OSC_TARGET)]
    osc_target: SocketAddr,

    /// Also write daily rotated logs to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print the media players the OS reports and exit
    #[arg(long)]
    list_players: bool,

    /// Write a config file with the defaults and exit
    #[arg(long)]
    write_default_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_dir.as_deref());

    let config_path = resolve_config_path(args.config.as_deref())?;

    if args.write_default_config {
        if write_default_config(&config_path)? {
            println!("Wrote default config to {}", config_path.display());
        } else {
            println!("{} already exists, left untouched", config_path.display());
        }
        return Ok(());
    }

    let config = load_config(&config_path)?;
    let provider = vrcnp_media_session::create_media_session();

    if args.list_players {
        for player in provider.list_active_players() {
            println!("{}", player);
        }
        return Ok(());
    }

    let _lock = InstanceLock::acquire("vrcnp")?;

    let oracle: Box<dyn BlacklistOracle> = match WorldBlacklist::from_config(&config) {
        Some(blacklist) => Box::new(blacklist),
        None => Box::new(AllowAll),
    };
    let chatbox = UdpChatbox::new(args.osc_target)
        .with_context(|| format!("Failed to open OSC socket for {}", args.osc_target))?;

    let mut ticker = Ticker::from_config(&config, provider, oracle, Box::new(chatbox));
    match ticker.source() {
        Source::TextFile(_) => tracing::info!("VRCNowPlaying is now running in text file mode"),
        Source::Media { .. } => tracing::info!("VRCNowPlaying is now running"),
    }

    run(&mut ticker).await;
    Ok(())
}

/// Tick until Ctrl-C. A slow tick pushes the next one back instead of bunching up.
async fn run(ticker: &mut Ticker) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                ticker.tick();
            }
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }
}

fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "vrcnp.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}
