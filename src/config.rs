//! Configuration loading.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use assetforge_av::QualityPreset;

use crate::convert::ConverterOptions;
use crate::images::NormalizeOptions;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub convert: ConvertConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConvertConfig {
    /// Long-edge bound for image downsampling
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// JPEG re-encode quality in (0.0, 1.0]
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: f32,

    /// Video quality preset: low, medium, high
    #[serde(default = "default_video_quality")]
    pub video_quality: String,

    /// Load full container bytes into video selections
    #[serde(default)]
    pub keep_raw_bytes: bool,
}

fn default_max_dimension() -> u32 {
    2048
}
fn default_jpeg_quality() -> f32 {
    0.8
}
fn default_video_quality() -> String {
    "medium".to_string()
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
            video_quality: default_video_quality(),
            keep_raw_bytes: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Hard capacity of the video handle cache
    #[serde(default = "default_video_capacity")]
    pub video_capacity: usize,

    /// Approximate byte budget for the decoded-image cache
    #[serde(default = "default_image_budget")]
    pub image_budget_bytes: usize,
}

fn default_video_capacity() -> usize {
    5
}
fn default_image_budget() -> usize {
    256 * 1024 * 1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            video_capacity: default_video_capacity(),
            image_budget_bytes: default_image_budget(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory for downloaded, copied, and transcoded files
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Age after which `sweep_scratch` reclaims files
    #[serde(default = "default_sweep_age")]
    pub sweep_age_secs: u64,
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("assetforge")
}
fn default_sweep_age() -> u64 {
    86_400
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            sweep_age_secs: default_sweep_age(),
        }
    }
}

impl Config {
    /// Resolve the converter tuning from the validated config.
    pub fn converter_options(&self) -> ConverterOptions {
        ConverterOptions {
            normalize: NormalizeOptions {
                max_dimension: self.convert.max_dimension,
                jpeg_quality: self.convert.jpeg_quality,
            },
            video_quality: self
                .convert
                .video_quality
                .parse()
                .unwrap_or(QualityPreset::Medium),
            scratch_dir: self.storage.scratch_dir.clone(),
            keep_raw_bytes: self.convert.keep_raw_bytes,
            image_cache_budget: self.cache.image_budget_bytes,
            video_cache_capacity: self.cache.video_capacity,
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./assetforge.toml",
        "~/.config/assetforge/config.toml",
        "/etc/assetforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.convert.max_dimension == 0 {
        anyhow::bail!("convert.max_dimension cannot be 0");
    }

    if !(config.convert.jpeg_quality > 0.0 && config.convert.jpeg_quality <= 1.0) {
        anyhow::bail!(
            "convert.jpeg_quality must be in (0.0, 1.0], got {}",
            config.convert.jpeg_quality
        );
    }

    if config.convert.video_quality.parse::<QualityPreset>().is_err() {
        anyhow::bail!(
            "convert.video_quality must be one of low/medium/high, got '{}'",
            config.convert.video_quality
        );
    }

    if config.cache.video_capacity == 0 {
        anyhow::bail!("cache.video_capacity cannot be 0");
    }

    Ok(())
}
