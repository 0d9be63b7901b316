//! Upload a local file through an Upload Gate server

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use upload_gate_server::client::{ClientConfig, MultipartUploader, DEFAULT_CONFIG_FILE};

/// Multipart file upload client
#[derive(Parser, Debug)]
#[command(name = "upload-client")]
#[command(about = "Upload a file to an Upload Gate server in multipart chunks")]
struct Args {
    /// File to upload
    file_path: PathBuf,

    /// Resource name (object key) to store the file under
    resource_name: String,

    /// Path to the JSON config holding `worker_url` and `jwt_secret`
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upload_gate_server=info".into()),
        )
        .with_target(false)
        .init();

    if !args.config.exists() {
        println!("Configuration file {} not found.", args.config.display());
        ClientConfig::write_sample(&args.config)?;
        println!("Sample configuration created: {}", args.config.display());
        println!("Please edit the file with your actual worker URL and JWT secret.");
        return Ok(ExitCode::FAILURE);
    }

    let config = ClientConfig::load(&args.config)?;
    let uploader = MultipartUploader::new(&config)?;

    match uploader.upload_file(&args.file_path, &args.resource_name).await {
        Ok(summary) => {
            println!();
            println!("Upload successful!");
            println!("Resource name: {}", summary.resource_name);
            println!("File URL: {}", summary.file_url);
            println!("ETag: {}", summary.etag);
            println!("Size: {} bytes", summary.size);
            println!("Upload time: {:.2} seconds", summary.elapsed.as_secs_f64());
            println!("Average speed: {:.2} MB/s", summary.average_speed_mib());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Upload failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
