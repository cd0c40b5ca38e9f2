// slackstat: cache Slack workspace history locally and report on who says what where.

mod analysis;
mod cache;
mod config;
mod datasets;
mod error;
mod report;
mod slack;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cache::{KeyedCache, user_cache_dir};
use crate::config::Config;
use crate::datasets::DatasetGraph;
use crate::error::{Result, SlackstatError};
use crate::slack::{OutgoingMessage, RemoteClient, SlackClient};

#[derive(Parser)]
#[command(
    name = "slackstat",
    about = "Cache Slack workspace history and report per-user activity",
    version
)]
struct Cli {
    /// Cache directory (default: $SLACKSTAT_CACHE_DIR or ./cache)
    #[arg(long, global = true, conflicts_with = "user_cache")]
    cache_dir: Option<PathBuf>,

    /// Use the per-user platform cache directory
    #[arg(long, global = true)]
    user_cache: bool,

    /// Re-fetch channels, users, and the datasets built from them. Each is fetched once per run;
    /// per-channel histories stay cached unless --refresh-history is given
    #[arg(short, long, global = true)]
    refresh: bool,

    /// Also re-fetch every channel's history (implies --refresh)
    #[arg(long, global = true)]
    refresh_history: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print channels, totals, and the most active users (default)
    Report {
        /// Number of users in the leaderboard
        #[arg(short, long, default_value_t = 20)]
        top: usize,
        /// Also print the per-channel breakdown for this user (real name)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Print the per-channel message counts of one user
    User {
        /// Real name as shown in the workspace
        name: String,
    },

    /// Write every visible user email to a CSV file
    Emails {
        /// Output path
        #[arg(short, long, default_value = "useremails.csv")]
        out: PathBuf,
    },

    /// Post a message to a channel after confirmation
    Post {
        /// Channel name or id
        #[arg(short, long)]
        channel: String,
        /// Message text
        #[arg(short, long)]
        text: String,
        /// Display name to post as
        #[arg(short, long)]
        username: Option<String>,
        /// Icon as an :emoji: shortcode or an image URL
        #[arg(short, long)]
        icon: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report.
    let filter = if cli.verbose {
        EnvFilter::new("slackstat=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slackstat=info,warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    } else if cli.user_cache {
        config.cache_dir = user_cache_dir()
            .ok_or_else(|| SlackstatError::Other("No home directory for the user cache".into()))?;
    }

    let client = SlackClient::from_config(&config)?;
    client.check_connection().await?;

    let cache = KeyedCache::new(&config.cache_dir);
    info!(cache_dir = %cache.root().display(), "connected to Slack");
    let graph = DatasetGraph::new(&client, &cache).with_history_refresh(cli.refresh_history);
    let force = cli.refresh || cli.refresh_history;
    let mut stdout = io::stdout().lock();

    match cli.command.unwrap_or(Commands::Report { top: 20, user: None }) {
        Commands::Report { top, user } => {
            let channels = graph.channels(force).await?;
            let users = graph.all_users(force).await?;
            let history = graph.all_history(force, false).await?;
            let leaderboard = analysis::top_users(history.messages(), &users);
            report::write_overview(
                &mut stdout,
                &channels,
                users.len(),
                history.messages().len(),
                &leaderboard,
                top,
            )?;

            if let Some(name) = user {
                let activity = graph.user_activity(&name, force).await?;
                writeln!(stdout)?;
                report::write_user_breakdown(&mut stdout, &name, &activity)?;
            }
        }
        Commands::User { name } => {
            let activity = graph.user_activity(&name, force).await?;
            report::write_user_breakdown(&mut stdout, &name, &activity)?;
        }
        Commands::Emails { out } => {
            let emails = graph.all_emails(force).await?;
            report::write_emails_csv(&out, &emails)?;
            info!(count = emails.len(), path = %out.display(), "wrote emails");
        }
        Commands::Post {
            channel,
            text,
            username,
            icon,
            yes,
        } => {
            let channels = graph.channels(force).await?;
            let channel_id = channels
                .get(&channel)
                .or_else(|| channels.values().find(|id| **id == channel))
                .cloned()
                .ok_or_else(|| SlackstatError::UnknownChannel(channel.clone()))?;

            let prompt = format!("Post {:?} to {} ({})?", text, channel, channel_id);
            if !yes && !report::confirm(&mut io::stdin().lock(), &mut stdout, &prompt)? {
                info!("not posting");
                return Ok(());
            }

            let message = OutgoingMessage {
                text,
                username,
                icon,
            };
            let posted = graph.client().post_message(&channel_id, &message).await?;
            info!(channel = %posted.channel, ts = %posted.ts, "message posted");
        }
    }

    Ok(())
}
