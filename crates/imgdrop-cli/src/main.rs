//! imgdrop CLI: run files through the intake pipeline and manage the
//! persisted collection.
//!
//! The collection lives in a local directory store (`--store`,
//! `IMGDROP_STORE_PATH`, or `.imgdrop`). Every other setting comes from the
//! `IMGDROP_*` environment variables.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use imgdrop::{
    create_store, format_file_size, AddOutcome, CropShape, CropSpec, RawFile, SessionSpec,
    StoreConfig, Uploader, UploaderConfig, UploaderParts,
};
use imgdrop_cli::{format_row, init_tracing, store_dir, ConsoleObserver};

#[derive(Parser)]
#[command(name = "imgdrop", about = "Image upload intake")]
struct Cli {
    /// Directory holding the persisted collection
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, compress and add files to the collection
    Add {
        /// Files to add
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Crop a single image with a centered selection: circle or square
        #[arg(long)]
        crop: Option<CropShape>,
    },
    /// List the collection
    List,
    /// Remove the file at the given position
    Remove {
        /// Zero-based position, as shown by `list`
        index: usize,
    },
    /// Remove every file
    Clear,
}

async fn build_uploader(
    store: Option<PathBuf>,
    crop: Option<CropShape>,
) -> anyhow::Result<Uploader> {
    let mut config = UploaderConfig::from_env().context("Invalid IMGDROP_* configuration")?;
    if config.active_session().is_none() {
        config.session = Some(SessionSpec {
            enabled: true,
            ..Default::default()
        });
    }
    if let Some(shape) = crop {
        config.crop = Some(CropSpec::new(shape));
    }

    let store_config = StoreConfig::from_env().context("Invalid IMGDROP_STORE configuration")?;
    let dir = store_dir(store, store_config.local_path);
    let store = create_store(&StoreConfig::local(&dir))
        .await
        .with_context(|| format!("Failed to open store at {}", dir.display()))?;
    tracing::debug!(path = %dir.display(), "Using store");

    let parts = UploaderParts::default()
        .with_store(store)
        .with_observer(Arc::new(ConsoleObserver));
    Ok(Uploader::new(config, parts).await?)
}

fn print_collection(uploader: &Uploader) {
    let files = uploader.get_all();
    if files.is_empty() {
        println!("No files.");
        return;
    }

    println!(
        "{:>5} {:<30} {:<20} {:>12} {:>20}",
        "#", "Name", "Type", "Size", "Last Modified"
    );
    println!("{}", "-".repeat(91));
    for (index, record) in files.iter().enumerate() {
        println!("{}", format_row(index, record));
    }

    let total: u64 = files.iter().map(|r| r.meta().size).sum();
    println!("\n{} file(s), {}", files.len(), format_file_size(total));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Add { paths, crop } => {
            let mut uploader = build_uploader(cli.store, crop).await?;

            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                let file = RawFile::from_path(path)
                    .await
                    .with_context(|| format!("Cannot read {}", path.display()))?;
                files.push(file);
            }

            match uploader.add_files(files).await? {
                AddOutcome::Accepted(count) => println!("Added {} file(s).", count),
                AddOutcome::Cropped => println!("Added 1 cropped image."),
                AddOutcome::CropCancelled => println!("Crop cancelled, nothing added."),
                AddOutcome::NothingAdmitted => println!("Nothing added."),
                AddOutcome::Disabled => println!("Uploader is disabled (IMGDROP_DISABLED)."),
            }
            print_collection(&uploader);
            uploader.detach().await;
        }
        Commands::List => {
            let uploader = build_uploader(cli.store, None).await?;
            print_collection(&uploader);
            uploader.detach().await;
        }
        Commands::Remove { index } => {
            let mut uploader = build_uploader(cli.store, None).await?;
            uploader.remove_at(index).await?;
            print_collection(&uploader);
            uploader.detach().await;
        }
        Commands::Clear => {
            let mut uploader = build_uploader(cli.store, None).await?;
            uploader.clear_all().await;
            println!("Collection cleared.");
        }
    }

    Ok(())
}
