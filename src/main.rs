mod cli;

use bytes::Bytes;
use clap::Parser;
use cli::{Cli, Commands, SourceArgs};
use debridge::config::Config;
use debridge::debrid::{
    CancelSignal, DebridClient, DebridError, DebridProvider, FileRecord, ProviderKind,
    cancel_pair, magnet_from_hash,
};
use serde::Serialize;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();
    let config = Config::load()?;

    debridge::observability::init_tracing(&config.logging.filter);

    if let Commands::Providers = cli.command {
        return print_json(&ProviderKind::descriptors());
    }

    let client = DebridClient::from_credentials(
        cli.provider,
        &config.credentials,
        &config.provider_options(),
    )?;

    // Ctrl-C abandons enumeration and link resolution waits
    let (handle, cancel) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            handle.cancel();
        }
    });

    match cli.command {
        Commands::Providers => {}
        Commands::Files(source) => {
            let files = enumerate(&client, &source, cancel).await?;
            print_json(&files)?;
        }
        Commands::Resolve { source, index } => {
            let files = enumerate(&client, &source, cancel.clone()).await?;
            let file = files.get(index).ok_or_else(|| {
                DebridError::Resolution(format!(
                    "file index {} out of range ({} files)",
                    index,
                    files.len()
                ))
            })?;
            let url = client.get_download_cancellable(file, cancel).await?;
            println!("{}", url);
        }
        Commands::Progress => {
            let progress = client.get_progress_torrents(&[]).await?;
            print_json(&progress)?;
        }
        Commands::UserHash => {
            println!("{}", client.get_user_hash().await?);
        }
    }

    Ok(())
}

async fn enumerate(
    client: &DebridClient,
    source: &SourceArgs,
    cancel: CancelSignal,
) -> Result<Vec<FileRecord>, AnyError> {
    let files = match (&source.torrent, &source.magnet) {
        (Some(path), _) => {
            let bytes = tokio::fs::read(path).await?;
            client
                .get_files_from_buffer_cancellable(Bytes::from(bytes), &source.hash, cancel)
                .await?
        }
        (None, Some(magnet)) => {
            client
                .get_files_from_magnet_cancellable(magnet, &source.hash, cancel)
                .await?
        }
        (None, None) => {
            let magnet = magnet_from_hash(&source.hash);
            client
                .get_files_from_magnet_cancellable(&magnet, &source.hash, cancel)
                .await?
        }
    };
    Ok(files)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AnyError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
