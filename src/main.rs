mod cli;

use assetforge::config;
use assetforge::convert::AssetConverter;
use assetforge::selection::Selection;
use assetforge::source::{AssetLocation, AssetRef, DeclaredKind};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "assetforge=trace,assetforge_av=trace".to_string()
        } else {
            "assetforge=info,assetforge_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            video,
            quality,
            max_dimension,
            out_dir,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert(
                cli.config.as_deref(),
                input,
                video,
                quality,
                max_dimension,
                out_dir,
            ))
        }
        Commands::Probe { path } => probe_file(&path),
        Commands::Tools => report_tools(),
    }
}

async fn convert(
    config_path: Option<&Path>,
    input: String,
    video: bool,
    quality: Option<String>,
    max_dimension: Option<u32>,
    out_dir: PathBuf,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let mut options = config.converter_options();

    if let Some(quality) = quality {
        options.video_quality = quality
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
    }
    if let Some(max_dimension) = max_dimension {
        options.normalize.max_dimension = max_dimension;
    }

    let location = if input.starts_with("http://") || input.starts_with("https://") {
        AssetLocation::Url(input)
    } else {
        let path = PathBuf::from(&input);
        if !path.exists() {
            anyhow::bail!("Input file does not exist: {:?}", path);
        }
        AssetLocation::File(path)
    };
    let kind = if video {
        DeclaredKind::Video
    } else {
        DeclaredKind::Image
    };

    let converter = AssetConverter::new(options);
    let selection = converter.convert(AssetRef::new(kind, location)).await?;

    match selection {
        Selection::Image(image) => {
            std::fs::create_dir_all(&out_dir)?;
            let dest = out_dir.join(&image.id);
            std::fs::write(&dest, &image.encoded)
                .with_context(|| format!("Failed to write {}", dest.display()))?;
            println!("{} ({} bytes)", dest.display(), image.encoded.len());
        }
        Selection::Video(video) => {
            println!("{} -> {}", video.id, video.local_path.display());
            if let Some(duration) = &video.duration {
                println!("duration: {}", duration);
            }
            if let Some(thumbnail) = &video.thumbnail {
                std::fs::create_dir_all(&out_dir)?;
                let stem = video.id.trim_end_matches(".mp4");
                let dest = out_dir.join(format!("{}.thumb.jpg", stem));
                std::fs::write(&dest, thumbnail)?;
                println!("thumbnail: {}", dest.display());
            }
        }
    }

    Ok(())
}

fn probe_file(path: &Path) -> Result<()> {
    let info = assetforge_av::probe(path)?;

    println!("File: {}", info.path.display());
    if let Some(duration) = info.duration {
        println!("Duration: {}", assetforge_av::duration_label(duration));
    }
    match info.video {
        Some(video) => {
            let fps = video
                .frame_rate
                .map(|r| format!(" @ {:.3} fps", r))
                .unwrap_or_default();
            println!("Video: {} {}x{}{}", video.codec, video.width, video.height, fps);
        }
        None => println!("Video: none"),
    }

    Ok(())
}

fn report_tools() -> Result<()> {
    for tool in assetforge_av::check_tools() {
        if tool.available {
            let version = tool.version.unwrap_or_else(|| "unknown version".to_string());
            match tool.path {
                Some(path) => println!("{}: {} ({})", tool.name, version, path.display()),
                None => println!("{}: {}", tool.name, version),
            }
        } else {
            println!("{}: not found", tool.name);
        }
    }
    Ok(())
}
