use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "areg",
    about = "Permissioned asset registry with versioning and an audit trail",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Registry snapshot file, created on first write.
    #[arg(long, global = true, default_value = "areg-state.json")]
    pub state: PathBuf,

    /// Acting principal: a handle or a 64-hex identity.
    #[arg(long = "as", global = true)]
    pub caller: Option<String>,

    /// Logical sequence for this call. Defaults to one past the last seen.
    #[arg(long, global = true)]
    pub at: Option<u64>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a new asset
    Register(RegisterArgs),
    /// Record a new content version
    Revise(ReviseArgs),
    /// Replace an asset's descriptive metadata
    Update(UpdateArgs),
    /// Grant or replace a user's access
    Grant(GrantArgs),
    /// Revoke a user's access
    Revoke(RevokeArgs),
    /// Hand ownership to another principal
    Transfer(TransferArgs),
    /// Retire an asset
    Retire(AssetArgs),
    /// Rate an asset from 1 to 5
    Rate(RateArgs),
    /// Show an asset (counts as a view)
    Show(AssetArgs),
    /// Show version history
    History(AssetArgs),
    /// Show a user's access to an asset
    Access(AccessArgs),
    /// Show usage analytics
    Analytics(AssetArgs),
    /// Show the audit trail
    Audit(AuditArgs),
    /// Verify the audit chain and every version history
    Verify,
    /// Show registry-wide statistics
    Stats,
    /// Start the HTTP server over the state file
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct AssetArgs {
    pub id: u64,
}

#[derive(Args)]
pub struct RegisterArgs {
    pub name: String,
    #[arg(long)]
    pub size: u64,
    #[arg(short, long)]
    pub description: String,
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
    /// 64-hex content digest.
    #[arg(long)]
    pub content_hash: String,
    #[arg(long)]
    pub encrypted: bool,
    #[arg(long, default_value = "")]
    pub key_hash: String,
    #[arg(long, default_value = "")]
    pub metadata: String,
}

#[derive(Args)]
pub struct ReviseArgs {
    pub id: u64,
    #[arg(short, long)]
    pub description: String,
    #[arg(long)]
    pub size: u64,
    #[arg(long)]
    pub content_hash: String,
    #[arg(short, long)]
    pub summary: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: u64,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub size: u64,
    #[arg(short, long)]
    pub description: String,
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args)]
pub struct GrantArgs {
    pub id: u64,
    pub user: String,
    #[arg(long)]
    pub read: bool,
    #[arg(long)]
    pub write: bool,
    #[arg(long)]
    pub admin: bool,
    /// Sequence at which the grant stops applying.
    #[arg(long)]
    pub expires_at: Option<u64>,
}

#[derive(Args)]
pub struct RevokeArgs {
    pub id: u64,
    pub user: String,
}

#[derive(Args)]
pub struct TransferArgs {
    pub id: u64,
    pub new_owner: String,
}

#[derive(Args)]
pub struct RateArgs {
    pub id: u64,
    pub rating: u8,
}

#[derive(Args)]
pub struct AccessArgs {
    pub id: u64,
    /// Defaults to the acting principal.
    #[arg(long)]
    pub user: Option<String>,
}

#[derive(Args)]
pub struct AuditArgs {
    /// Limit to one asset.
    #[arg(long)]
    pub asset: Option<u64>,
    /// Print per-action and per-actor counts instead of entries.
    #[arg(long)]
    pub summary: bool,
    /// First audit id to list.
    #[arg(long)]
    pub from: Option<u64>,
    /// Last audit id to list.
    #[arg(long)]
    pub to: Option<u64>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Server config file (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<String>,
}
