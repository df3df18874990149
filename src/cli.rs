use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

use crate::model::MediaKind;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the persisted login session.
    #[arg(long, default_value = ".bookgate", global = true)]
    pub data_dir: String,

    /// Gateway base URL used by the client commands.
    #[arg(long, default_value = "http://127.0.0.1:8080", global = true)]
    pub gateway: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the proxy/auth gateway.
    Serve(ServeArgs),
    /// Exchange credentials for a token and persist the session.
    Login(LoginArgs),
    /// Drop the persisted session.
    Logout,
    /// Show the logged-in identity.
    Whoami,
    /// Search the catalog.
    Search(SearchArgs),
    /// Show one catalog entry by id.
    Show(ShowArgs),
    /// Create a catalog entry (admin only).
    Create(CreateArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Title substring.
    #[arg(long)]
    pub title: Option<String>,

    /// ISBN substring.
    #[arg(long)]
    pub isbn: Option<String>,

    #[arg(long, value_enum)]
    pub kind: Option<MediaKind>,

    /// Only available entries.
    #[arg(long)]
    pub available: bool,

    /// Rating (0-5).
    #[arg(long)]
    pub rating: Option<u8>,

    /// Page number, counted from 1.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long)]
    pub size: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub isbn: String,

    #[arg(long)]
    pub price: f64,

    /// Discount in percent (stored as a fraction).
    #[arg(long)]
    pub discount_percent: Option<f64>,

    #[arg(long)]
    pub homepage: Option<String>,

    /// Release date as `YYYY-MM-DD`.
    #[arg(long)]
    pub date: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub rating: u8,

    #[arg(long)]
    pub available: bool,

    #[arg(long, value_enum)]
    pub kind: Option<MediaKind>,
}
