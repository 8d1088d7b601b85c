//! Landchain CLI - Main entry point

use clap::{Parser, Subcommand};
use landchain_rpc::{commands, AppContext};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "landchain")]
#[command(about = "Landchain - hash-chained land registry", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory
    Init,

    /// Register a new land parcel
    Register {
        /// Plot number (e.g. DHAKA-001)
        plot: String,
        /// Location description
        location: String,
        /// Area in acres
        area: Decimal,
        /// Owner party id
        owner: i64,
    },

    /// Submit an ownership transfer request
    Transfer {
        /// Plot number
        plot: String,
        /// Buyer party id
        buyer: i64,
        /// Agreed price
        price: Decimal,
    },

    /// Approve a pending transfer (records it on the chain)
    Approve {
        /// Transfer request id (e.g. TRX-4F2A9C01)
        request_id: String,
    },

    /// Reject a pending transfer
    Reject {
        /// Transfer request id
        request_id: String,
        /// Optional reason shown to the requester
        #[arg(long)]
        reason: Option<String>,
    },

    /// List pending transfer requests
    Pending,

    /// Display the ledger
    Chain {
        /// Filter by plot number
        #[arg(long)]
        parcel: Option<String>,
        /// Filter by participant (seller or buyer)
        #[arg(long)]
        party: Option<i64>,
        /// Maximum number of blocks to show
        #[arg(long, default_value = "50")]
        limit: u32,
    },

    /// Audit the ledger (verify the hash chain)
    Audit,

    /// Show the verified transfer history of a parcel
    History {
        /// Plot number
        plot: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Create application context
    let ctx = AppContext::new(&cli.data).await?;

    match cli.command {
        Commands::Init => {
            commands::init(&ctx).await?;
        }

        Commands::Register {
            plot,
            location,
            area,
            owner,
        } => {
            commands::register(&ctx, &plot, &location, area, owner).await?;
        }

        Commands::Transfer { plot, buyer, price } => {
            commands::transfer(&ctx, &plot, buyer, price).await?;
        }

        Commands::Approve { request_id } => {
            commands::approve(&ctx, &request_id).await?;
        }

        Commands::Reject { request_id, reason } => {
            commands::reject(&ctx, &request_id, reason.as_deref()).await?;
        }

        Commands::Pending => {
            commands::pending(&ctx).await?;
        }

        Commands::Chain {
            parcel,
            party,
            limit,
        } => {
            commands::chain(&ctx, parcel.as_deref(), party, limit).await?;
        }

        Commands::Audit => {
            let intact = commands::audit(&ctx).await?;
            if !intact {
                std::process::exit(1);
            }
        }

        Commands::History { plot } => {
            commands::history(&ctx, &plot).await?;
        }
    }

    Ok(())
}
