use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "pipeline-cli")]
#[command(about = "Client for the grayscale relay pipeline", long_about = None)]
struct Cli {
    /// Base URL of the stage to talk to.
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload an image and save its grayscale version
    Upload {
        /// Image to upload
        file: PathBuf,

        /// Where to write the result
        #[arg(short, long, default_value = "image_grayscale.jpg")]
        output: PathBuf,
    },
    /// Show stage status
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Upload { file, output } => {
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let mime = mime_for(&file);

            let form = Form::new().part("image", Part::bytes(bytes).file_name(file_name).mime_str(mime)?);
            let res = client
                .post(format!("{base}/api/image/upload"))
                .multipart(form)
                .send()
                .await?;

            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: upload returned status {}", status);
                if let Ok(text) = res.text().await {
                    if !text.is_empty() {
                        eprintln!("Response: {}", text);
                    }
                }
                std::process::exit(1);
            }

            let jpeg = res.bytes().await?;
            tokio::fs::write(&output, &jpeg).await?;
            println!("Wrote {} bytes to {}", jpeg.len(), output.display());
        }
        Commands::Health => {
            let res = client.get(format!("{base}/health")).send().await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: health returned status {}", status);
                std::process::exit(1);
            }
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

fn mime_for(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "image/jpeg",
    }
}
