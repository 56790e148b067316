//! Inkstore CLI — encrypted blob store over a local data directory.
//!
//! Configuration comes from INKSTORE_* environment variables; see
//! `FileStoreConfig`. The store password may also be passed per command
//! with `--password`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use inkstore_cli::init_tracing;
use inkstore_core::{
    public_url, FileResourceId, FileStoreConfig, ReferenceCategory, ReferenceInfo,
};
use inkstore_crypto::KeyLength;
use inkstore_services::{
    Download, FileService, FileServiceConfig, JsonFileRepository, ThumbnailConfig, UploadRequest,
};
use inkstore_storage::LocalContainerStore;

#[derive(Parser)]
#[command(name = "inkstore", about = "Encrypted blob store CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt and store a file
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Content type recorded in the metadata
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
        /// Encryption password (falls back to INKSTORE_PASSWORD)
        #[arg(long)]
        password: Option<String>,
        /// Owning content item id to record a reference for
        #[arg(long)]
        owner: Option<String>,
        /// Role of the owner reference
        #[arg(long, value_enum, default_value_t = CategoryArg::Attachment)]
        category: CategoryArg,
    },
    /// Decrypt and fetch a stored file or one of its preview pages
    Download {
        /// Resource UUID
        id: String,
        /// Preview page index (1-based) instead of the main payload
        #[arg(long)]
        page: Option<u32>,
        /// First byte of a ranged read (requires --end)
        #[arg(long, requires = "end")]
        start: Option<u64>,
        /// Last byte of a ranged read, inclusive (requires --start)
        #[arg(long, requires = "start")]
        end: Option<u64>,
        /// Decryption password (falls back to INKSTORE_PASSWORD)
        #[arg(long)]
        password: Option<String>,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete a stored file and its preview pages
    Delete {
        /// Resource UUID
        id: String,
    },
    /// Verify a password against a stored resource
    CheckPassword {
        /// Resource UUID
        id: String,
        /// Password candidate
        password: String,
    },
    /// Print the public URL of a stored resource
    Url {
        /// Resource UUID
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Inline,
    Attachment,
    Cover,
}

impl From<CategoryArg> for ReferenceCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Inline => ReferenceCategory::Inline,
            CategoryArg::Attachment => ReferenceCategory::Attachment,
            CategoryArg::Cover => ReferenceCategory::Cover,
        }
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn build_service(config: &FileStoreConfig) -> anyhow::Result<FileService> {
    let store = LocalContainerStore::new(&config.data_dir)
        .await
        .context("Failed to open container store")?;
    let repository = JsonFileRepository::open(config.data_dir.join("index.json"))
        .await
        .context("Failed to open metadata index")?;

    let service_config = FileServiceConfig {
        key_length: KeyLength::from_bits(config.key_length_bits)
            .context("Invalid INKSTORE_KEY_LENGTH")?,
        kdf_iterations: config.kdf_iterations,
        bcrypt_cost: config.bcrypt_cost,
    };
    let thumbnails = ThumbnailConfig {
        soffice_path: config.soffice_path.clone(),
        pdftoppm_path: config.pdftoppm_path.clone(),
        slide_render_dpi: config.slide_dpi,
    };

    Ok(FileService::new(
        Arc::new(store),
        Arc::new(repository),
        thumbnails,
        service_config,
    ))
}

fn resolve_password(flag: Option<String>, config: &FileStoreConfig) -> anyhow::Result<String> {
    match flag {
        Some(password) => Ok(password),
        None if !config.password.is_empty() => Ok(config.password.clone()),
        None => anyhow::bail!("No password given: pass --password or set INKSTORE_PASSWORD"),
    }
}

async fn write_download(download: Download, output: Option<PathBuf>) -> anyhow::Result<()> {
    let mut body = download.body;

    match output {
        Some(path) => {
            let mut file = tokio::fs::File::create(&path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
            while let Some(chunk) = body.next().await {
                file.write_all(&chunk?).await?;
            }
            file.flush().await?;
        }
        None => {
            let mut stdout = tokio::io::stdout();
            while let Some(chunk) = body.next().await {
                stdout.write_all(&chunk?).await?;
            }
            stdout.flush().await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = FileStoreConfig::from_env().context("Invalid configuration")?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            file,
            content_type,
            password,
            owner,
            category,
        } => {
            let service = build_service(&config).await?;
            let password = resolve_password(password, &config)?;
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = file
                .file_name()
                .context("Input path has no filename")?
                .to_string_lossy()
                .into_owned();

            let resource = service
                .upload(UploadRequest {
                    data,
                    filename,
                    content_type,
                    password,
                    owner: owner.map(|o| ReferenceInfo::new(o, category.into())),
                })
                .await?;
            print_json(&resource)?;
        }
        Commands::Download {
            id,
            page,
            start,
            end,
            password,
            output,
        } => {
            let service = build_service(&config).await?;
            let password = resolve_password(password, &config)?;
            let id: FileResourceId = id.parse().context("Invalid resource id")?;

            let download = match (start, end) {
                (Some(start), Some(end)) => {
                    anyhow::ensure!(page.is_none(), "--page cannot be combined with a range");
                    service.download_range(id, start, end, &password).await?
                }
                _ => service.download(id, page, &password).await?,
            };
            write_download(download, output).await?;
        }
        Commands::Delete { id } => {
            let service = build_service(&config).await?;
            let id: FileResourceId = id.parse().context("Invalid resource id")?;
            let existed = service.delete(id).await?;
            print_json(&serde_json::json!({ "deleted": existed, "id": id }))?;
        }
        Commands::CheckPassword { id, password } => {
            let service = build_service(&config).await?;
            let id: FileResourceId = id.parse().context("Invalid resource id")?;
            let matches = service.check_password(id, &password).await?;
            print_json(&serde_json::json!({ "matches": matches, "id": id }))?;
        }
        Commands::Url { id } => {
            let id: FileResourceId = id.parse().context("Invalid resource id")?;
            let path = public_url(&id);
            let url = format!("{}{}", config.url_base.trim_end_matches('/'), path);
            print_json(&serde_json::json!({ "id": id, "url": url }))?;
        }
    }

    Ok(())
}
