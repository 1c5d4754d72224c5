use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;

pub use app::{
    run_app, world_to_screen_px, AppError, CameraRig, Entity, EntityId, InputAction,
    InputSnapshot, LoopConfig, RenderShape, RenderableDesc, Renderer, Scene, SceneCommand,
    SceneWorld, Transform, Vec3, Viewport, PIXELS_PER_WORLD,
};

/// Overrides project-root discovery.
pub const ROOT_ENV_VAR: &str = "SHRINE_QUEST_ROOT";

/// Where the game reads its content from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    pub base_content_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("SHRINE_QUEST_ROOT={} has no Cargo.toml and assets/ directory", .0.display())]
    BadRootOverride(PathBuf),
    #[error("cannot locate the running executable: {0}")]
    Executable(#[source] io::Error),
    #[error("no project root above '{}'; set SHRINE_QUEST_ROOT to the checkout", .0.display())]
    NoRootAbove(PathBuf),
}

impl AppPaths {
    /// `SHRINE_QUEST_ROOT` if set, else the nearest project root above the executable.
    pub fn resolve() -> Result<Self, StartupError> {
        let root = match env::var_os(ROOT_ENV_VAR) {
            Some(raw) => {
                let root = canonical(Path::new(&raw));
                if !is_project_root(&root) {
                    return Err(StartupError::BadRootOverride(root));
                }
                root
            }
            None => {
                let exe = env::current_exe().map_err(StartupError::Executable)?;
                find_project_root(&exe).ok_or(StartupError::NoRootAbove(exe))?
            }
        };
        Ok(Self::at(root))
    }

    pub fn at(root: PathBuf) -> Self {
        Self {
            base_content_dir: root.join("assets").join("base"),
            root,
        }
    }
}

fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| is_project_root(dir))
        .map(canonical)
}

fn is_project_root(dir: &Path) -> bool {
    dir.join("Cargo.toml").is_file() && dir.join("assets").is_dir()
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace_root() -> PathBuf {
        canonical(&Path::new(env!("CARGO_MANIFEST_DIR")).join("../.."))
    }

    #[test]
    fn search_climbs_past_member_crates_to_the_workspace() {
        let start = Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join("lib.rs");

        assert_eq!(find_project_root(&start), Some(workspace_root()));
    }

    #[test]
    fn member_crate_is_not_a_project_root() {
        assert!(!is_project_root(Path::new(env!("CARGO_MANIFEST_DIR"))));
        assert!(is_project_root(&workspace_root()));
    }

    #[test]
    fn content_lives_under_assets_base() {
        let paths = AppPaths::at(PathBuf::from("/srv/quest"));

        assert_eq!(paths.root, PathBuf::from("/srv/quest"));
        assert_eq!(paths.base_content_dir, Path::new("/srv/quest/assets/base"));
    }

    #[test]
    fn missing_root_error_names_the_env_var() {
        let error = StartupError::NoRootAbove(PathBuf::from("/tmp/bin/shrine_quest"));
        assert_eq!(
            error.to_string(),
            "no project root above '/tmp/bin/shrine_quest'; set SHRINE_QUEST_ROOT to the checkout"
        );
    }
}
