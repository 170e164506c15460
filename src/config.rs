use crate::services::excel::DetectionConfig;
use crate::services::merge::MergeConfig;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_PROJECTS_CSV_URL: &str = "https://hebbkx1anhila5yf.public.blob.vercel-storage.com/compounds_developers_list_final-hPrjHwy1d7p9LDKZcRoHHacIHU1ThQ.csv";

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub max_file_size: usize,
    pub projects_csv_url: String,
    pub detection: DetectionConfig,
    pub merge: MergeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_file_size: default_max_file_size(),
            projects_csv_url: DEFAULT_PROJECTS_CSV_URL.to_string(),
            detection: DetectionConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from a key lookup, falling back to defaults for
    /// missing keys. Present but unparsable values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let detection = DetectionConfig {
            min_rows: parse_or(&lookup, "MIN_TABLE_ROWS", defaults.detection.min_rows)?,
            min_columns: parse_or(&lookup, "MIN_TABLE_COLUMNS", defaults.detection.min_columns)?,
            min_data_cells: parse_or(&lookup, "MIN_DATA_CELLS", defaults.detection.min_data_cells)?,
            min_consistency: parse_or(
                &lookup,
                "MIN_COLUMN_CONSISTENCY",
                defaults.detection.min_consistency,
            )?,
        };
        let merge = MergeConfig {
            similarity_threshold: parse_or(
                &lookup,
                "SIMILARITY_THRESHOLD",
                defaults.merge.similarity_threshold,
            )?,
        };

        if !(0.0..=1.0).contains(&detection.min_consistency) {
            anyhow::bail!("MIN_COLUMN_CONSISTENCY must be between 0 and 1");
        }
        if merge.similarity_threshold > 100 {
            anyhow::bail!("SIMILARITY_THRESHOLD must be between 0 and 100");
        }

        Ok(Config {
            addr: parse_or(&lookup, "SHEET_SPLITTER_ADDR", defaults.addr)?,
            max_file_size: parse_or(&lookup, "MAX_FILE_SIZE", defaults.max_file_size)?,
            projects_csv_url: lookup("PROJECTS_CSV_URL").unwrap_or(defaults.projects_csv_url),
            detection,
            merge,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {}={}", key, raw)),
        None => Ok(default),
    }
}

pub fn load_config() -> Result<Config> {
    Config::new()
}
