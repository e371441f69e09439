mod client;
mod commands;
mod links;
mod render;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slotlink")]
#[command(about = "Build, inspect and book shareable scheduling links")]
struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create booking and edit links from slot keys
    New {
        /// Meeting title
        #[arg(long)]
        title: String,

        /// Your name
        #[arg(long)]
        name: String,

        /// Your email, where bookings are sent
        #[arg(long)]
        email: String,

        /// Meeting length in minutes (15, 30, 45, 60 or 90)
        #[arg(short, long, default_value_t = 30)]
        duration: u32,

        /// Video call link included in invites
        #[arg(long)]
        link: Option<String>,

        /// Timezone the slot keys are in (defaults to this machine's)
        #[arg(long)]
        tz: Option<String>,

        /// Page the links point at (defaults to base_url from config)
        #[arg(long)]
        base_url: Option<String>,

        /// Create the schedule on this booking service, which answers with
        /// its own links
        #[arg(long)]
        server: Option<String>,

        /// Also mail the edit link to --email (uses the configured server
        /// address unless --server is given)
        #[arg(long)]
        email_edit: bool,

        /// Slot keys in local time, e.g. 2024-01-15T09:30
        #[arg(required = true)]
        slots: Vec<String>,
    },
    /// Show the slots a booking link offers
    Show {
        /// Booking link, token or stored booking id
        link: String,

        /// Timezone to show times in (defaults to this machine's)
        #[arg(long)]
        tz: Option<String>,

        /// Booking service to look up stored booking ids
        #[arg(long)]
        server: Option<String>,
    },
    /// Show what an edit link would pre-fill
    Edit {
        /// Edit link or token
        link: String,

        /// Timezone for the grid (defaults to the link's, then this machine's)
        #[arg(long)]
        tz: Option<String>,
    },
    /// Print the availability grid for a week
    Week {
        /// Any date in the week to show (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Timezone for the grid (defaults to this machine's)
        #[arg(long)]
        tz: Option<String>,

        /// Include Saturday and Sunday
        #[arg(long)]
        weekends: bool,

        /// Mark the slots of this edit link or token
        #[arg(long)]
        edit: Option<String>,
    },
    /// Book a slot from a booking link
    Book {
        /// Booking link, token or stored booking id
        link: String,

        /// Slot number as listed by `slotlink show`
        #[arg(short, long)]
        slot: usize,

        /// Your name
        #[arg(long)]
        name: String,

        /// Your email, where the invite is sent
        #[arg(long)]
        email: String,

        /// Booking service URL (defaults to the configured server address)
        #[arg(long)]
        server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::New {
            title,
            name,
            email,
            duration,
            link,
            tz,
            base_url,
            server,
            email_edit,
            slots,
        } => {
            commands::new::run(commands::new::NewLink {
                title,
                name,
                email,
                duration,
                link,
                tz,
                base_url,
                server,
                email_edit,
                slots,
            })
            .await
        }
        Commands::Show { link, tz, server } => {
            commands::show::run(&link, tz.as_deref(), server.as_deref()).await
        }
        Commands::Edit { link, tz } => commands::edit::run(&link, tz.as_deref()),
        Commands::Week {
            date,
            tz,
            weekends,
            edit,
        } => commands::week::run(date.as_deref(), tz.as_deref(), weekends, edit.as_deref()),
        Commands::Book {
            link,
            slot,
            name,
            email,
            server,
        } => commands::book::run(&link, slot, &name, &email, server.as_deref()).await,
    }
}

/// `RUST_LOG` wins; otherwise the `-v` count picks the level.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
