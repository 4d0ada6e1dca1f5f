use cityblock_engine::catalog::COMMON_BLOCKS;
use cityblock_engine::projection::Projection;
use cityblock_server::assets::{AssetCache, FsAssetSource};
use cityblock_server::config::Config;
use cityblock_server::editor::{self, Editor};
use cityblock_server::{event_bus, http};

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("City-block editor");
    tracing::debug!("{:?}", config);

    let events = event_bus::channel();
    let source = FsAssetSource::new(&config.assets, &config.asset_url);
    let assets = AssetCache::with_events(source, events.clone());
    for block in COMMON_BLOCKS {
        assets.preload(block);
    }

    let (width, height) = config.canvas;
    let editor = Editor::new(Projection::new(width, height), config.export_metadata(), assets, events);
    let handle = editor::spawn(editor, config.frame_interval);
    handle.frame_loop().start();

    let app = http::with_block_files(http::router(handle.clone()), &config.asset_url, config.assets.clone());

    tokio::select! {
        result = http::start(app, &config.bind) => {
            if let Err(e) = result {
                tracing::error!("Server error: {:#}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, shutting down...");
        }
    }

    handle.frame_loop().stop();
}
