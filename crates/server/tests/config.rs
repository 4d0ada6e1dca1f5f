use std::path::PathBuf;
use std::time::Duration;

use cityblock_server::config::{Config, parse_canvas};

fn args(list: &[&str]) -> Vec<String> {
    std::iter::once("cityblock-server")
        .chain(list.iter().copied())
        .map(String::from)
        .collect()
}

#[test]
fn defaults_without_flags() {
    let config = Config::from_args(args(&[]));
    assert_eq!(config, Config::default());
    assert_eq!(config.bind, "0.0.0.0:8080");
    assert_eq!(config.canvas, (480, 470));
    assert_eq!(config.frame_interval, Duration::from_millis(16));
}

#[test]
fn flags_override_defaults() {
    let config = Config::from_args(args(&[
        "--bind", "127.0.0.1:9000",
        "--assets", "/srv/blocks",
        "--canvas", "800x600",
        "--frame-ms", "33",
        "--author", "ada",
    ]));
    assert_eq!(config.bind, "127.0.0.1:9000");
    assert_eq!(config.assets, PathBuf::from("/srv/blocks"));
    assert_eq!(config.canvas, (800, 600));
    assert_eq!(config.frame_interval, Duration::from_millis(33));
    assert_eq!(config.export_metadata().owner, "ada");
    assert_eq!(config.export_metadata().email, "builder@zanpo.com");
}

#[test]
fn bad_values_fall_back() {
    let config = Config::from_args(args(&["--canvas", "wide", "--frame-ms", "0", "--bind"]));
    assert_eq!(config.canvas, (480, 470));
    assert_eq!(config.frame_interval, Duration::from_millis(16));
    assert_eq!(config.bind, "0.0.0.0:8080");
}

#[test]
fn canvas_parsing() {
    assert_eq!(parse_canvas("480x470"), Some((480, 470)));
    assert_eq!(parse_canvas("640X480"), Some((640, 480)));
    assert_eq!(parse_canvas("0x10"), None);
    assert_eq!(parse_canvas("640"), None);
}
