//! Command-line configuration.
//!
//! Flags are `--name value` pairs; anything missing or unparsable falls
//! back to its default. Log verbosity comes from `RUST_LOG`.

use std::path::PathBuf;
use std::time::Duration;

use cityblock_engine::export::ExportMetadata;
use cityblock_engine::projection::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    /// Directory holding `{id}.svg` block visuals.
    pub assets: PathBuf,
    /// URL prefix the host fetches visuals from.
    pub asset_url: String,
    pub canvas: (u32, u32),
    pub frame_interval: Duration,
    pub author: String,
    pub email: String,
}

impl Default for Config {
    fn default() -> Self {
        let meta = ExportMetadata::default();
        Self {
            bind: "0.0.0.0:8080".into(),
            assets: "content/blocks".into(),
            asset_url: "/blocks".into(),
            canvas: (DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT),
            frame_interval: Duration::from_millis(16),
            author: meta.owner,
            email: meta.email,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_args(std::env::args())
    }

    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let flag = |name: &str| args.iter().skip_while(|a| *a != name).nth(1).cloned();
        let defaults = Self::default();

        Self {
            bind: flag("--bind").unwrap_or(defaults.bind),
            assets: flag("--assets").map_or(defaults.assets, PathBuf::from),
            asset_url: flag("--asset-url").unwrap_or(defaults.asset_url),
            canvas: flag("--canvas")
                .and_then(|s| parse_canvas(&s))
                .unwrap_or(defaults.canvas),
            frame_interval: flag("--frame-ms")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map_or(defaults.frame_interval, Duration::from_millis),
            author: flag("--author").unwrap_or(defaults.author),
            email: flag("--email").unwrap_or(defaults.email),
        }
    }

    pub fn export_metadata(&self) -> ExportMetadata {
        ExportMetadata {
            owner: self.author.clone(),
            email: self.email.clone(),
            ..ExportMetadata::default()
        }
    }
}

/// `WIDTHxHEIGHT`, both non-zero.
pub fn parse_canvas(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.split_once(['x', 'X'])?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}
