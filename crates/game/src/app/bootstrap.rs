use engine::{AppPaths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::QuestScene;
use super::quest::{load_world_config, WorldConfigError};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    WorldConfig(#[from] WorldConfigError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Shrine Quest Startup ===");

    let paths = AppPaths::resolve()?;
    let (world_config, source) = load_world_config(&paths.base_content_dir)?;
    info!(
        root = %paths.root.display(),
        source = source.as_str(),
        "world_config"
    );

    Ok(AppWiring {
        config: LoopConfig::default(),
        scene: Box::new(QuestScene::new(world_config)),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
