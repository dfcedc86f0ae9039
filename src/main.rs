use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use supabase_upload::{
    key::content_hash, object_key, FileDescriptor, LocalStorage, Provider, ProviderConfig, UploadParams,
    PROVIDER_NAME,
};

#[derive(Parser)]
#[command(name = "supabase-upload")]
#[command(about = "Upload and delete CMS media in a Supabase Storage bucket")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, help = "Config file path")]
    config: Option<String>,

    #[arg(long, help = "Bucket name (overrides config)")]
    bucket: Option<String>,

    #[arg(long, help = "Directory prefix inside the bucket (overrides config)")]
    directory: Option<String>,

    #[arg(long, help = "Use <year>/<month> when no directory is set")]
    dynamic_directory: bool,

    #[arg(long, help = "Store under a local directory instead of Supabase")]
    local: Option<PathBuf>,

    #[arg(long, help = "Public URL base for --local")]
    public_base: Option<String>,

    #[arg(long, help = "Output as JSON")]
    json: bool,
}

#[derive(clap::Args)]
struct FileArgs {
    name: String,
    #[arg(help = "Extension including the dot, e.g. .png")]
    ext: String,
    hash: String,
    #[arg(long, help = "Sub-directory below the directory prefix")]
    path: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Upload a file and print its public URL
    Upload {
        file: PathBuf,
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
        #[arg(long, help = "Version token (defaults to the content digest)")]
        hash: Option<String>,
    },
    /// Delete the object for a previously uploaded file
    Delete(FileArgs),
    /// Print the object key for a file without touching storage
    Key(FileArgs),
    GenerateConfig {
        #[arg(long, default_value = supabase_upload::config::DEFAULT_CONFIG_FILE, help = "Config file path")]
        output: String,
    },
}

impl FileArgs {
    fn descriptor(&self) -> FileDescriptor {
        let mut file = FileDescriptor::new(&self.name, &self.ext, &self.hash, "");
        file.path = self.path.clone();
        file
    }
}

fn descriptor_from_path(
    source: &Path,
    path: Option<String>,
    mime: String,
    hash: Option<String>,
) -> Result<FileDescriptor> {
    let buffer = std::fs::read(source)
        .with_context(|| format!("reading {}", source.display()))?;
    let name = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", source.display()))?;
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let hash = hash.unwrap_or_else(|| content_hash(&buffer));

    let mut file = FileDescriptor::new(name, ext, hash, mime).with_buffer(buffer);
    file.path = path;
    Ok(file)
}

fn build_provider(cli: &Cli, config: &ProviderConfig) -> Result<Provider> {
    match &cli.local {
        Some(root) => {
            let resolved = config.resolve_offline_on(Local::now().date_naive());
            let store = LocalStorage::new(root, &resolved.bucket, cli.public_base.clone());
            info!("Using local storage at {}", root.display());
            Ok(Provider::new(resolved, Arc::new(store)))
        }
        None => Ok(Provider::from_config(config)?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("supabase_upload=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::GenerateConfig { output } = &cli.command {
        ProviderConfig::default().save(output)?;
        if cli.json {
            println!("{}", serde_json::json!({"success": true, "config_file": output}));
        } else {
            println!("✅ Config written to {}", output);
        }
        return Ok(());
    }

    let mut config = ProviderConfig::load_or_create(cli.config.as_deref())?;
    config.apply_env();
    if let Some(bucket) = &cli.bucket {
        config.bucket = bucket.clone();
    }
    if let Some(directory) = &cli.directory {
        config.directory = directory.clone();
    }
    if cli.dynamic_directory {
        config.options.dynamic_directory = true;
    }

    if let Commands::Key(args) = &cli.command {
        let resolved = config.resolve_offline_on(Local::now().date_naive());
        let key = object_key(&resolved.directory, &args.descriptor());
        if cli.json {
            println!("{}", serde_json::json!({"key": key}));
        } else {
            println!("{}", key);
        }
        return Ok(());
    }

    let provider = build_provider(&cli, &config)?;
    let params = UploadParams::new();

    match cli.command {
        Commands::Upload { file, path, mime, hash } => {
            let mut descriptor = descriptor_from_path(&file, path, mime, hash)?;
            provider.upload(&mut descriptor, &params).await?;
            let key = provider.key_for(&descriptor);
            let url = descriptor.url.clone().unwrap_or_default();
            if cli.json {
                println!("{}", serde_json::json!({
                    "provider": PROVIDER_NAME,
                    "bucket": provider.config().bucket,
                    "key": key,
                    "url": url,
                    "file": descriptor,
                }));
            } else {
                println!("✅ Uploaded {} to {} bucket {}", file.display(), PROVIDER_NAME, provider.config().bucket);
                println!("   Key: {}", key);
                println!("   Hash: {}", descriptor.hash);
                println!("   URL: {}", url);
            }
        }
        Commands::Delete(args) => {
            let descriptor = args.descriptor();
            let key = provider.key_for(&descriptor);
            provider.delete(&descriptor, &params).await?;
            if cli.json {
                println!("{}", serde_json::json!({
                    "success": true,
                    "provider": PROVIDER_NAME,
                    "bucket": provider.config().bucket,
                    "key": key,
                }));
            } else {
                println!("🗑️  Deleted {} from bucket {}", key, provider.config().bucket);
            }
        }
        Commands::Key(_) | Commands::GenerateConfig { .. } => {}
    }

    Ok(())
}
