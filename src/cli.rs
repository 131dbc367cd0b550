use clap::{Args, Parser, Subcommand};
use debridge::debrid::ProviderKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "debridge")]
#[command(about = "Resolve torrents into direct links through a debrid provider", long_about = None)]
pub struct Cli {
    /// Provider id (realdebrid, torrserver)
    #[arg(long, global = true, default_value = "realdebrid")]
    pub provider: ProviderKind,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print provider descriptors
    Providers,
    /// Enumerate the files of a torrent
    Files(SourceArgs),
    /// Enumerate a torrent and resolve one of its files into a direct link
    Resolve {
        #[command(flatten)]
        source: SourceArgs,
        /// Position of the file in the enumerated listing
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
    /// Print download progress of every torrent on the account
    Progress,
    /// Print the fingerprint of the configured credentials
    UserHash,
}

/// Where the torrent comes from; the info-hash is always required
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Torrent info-hash
    #[arg(long)]
    pub hash: String,

    /// Magnet link (defaults to a bare magnet built from the hash)
    #[arg(long, conflicts_with = "torrent")]
    pub magnet: Option<String>,

    /// Path to a .torrent file
    #[arg(long)]
    pub torrent: Option<PathBuf>,
}
