use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::Vec3;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

pub(crate) const WORLD_CONFIG_FILE: &str = "world.json";

/// World layout and movement tuning. Every field is optional in the override file.
/// The completion radius and the crystal offset are not part of it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WorldConfig {
    pub(crate) shrine: Vec3,
    pub(crate) village: Vec3,
    pub(crate) elder: Vec3,
    pub(crate) player_spawn: Vec3,
    pub(crate) ground_height: f32,
    pub(crate) player_speed: f32,
    pub(crate) vertical_speed: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            shrine: Vec3::new(15.0, 5.0, 20.0),
            village: Vec3::new(-15.0, 0.5, -10.0),
            elder: Vec3::new(-15.0, 1.75, -12.0),
            player_spawn: Vec3::new(0.0, 1.0, 0.0),
            ground_height: 0.0,
            player_speed: 8.0,
            vertical_speed: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigSource {
    Defaults,
    File,
}

impl ConfigSource {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Defaults => "defaults",
            Self::File => "file",
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum WorldConfigError {
    #[error("read world config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse world config '{}'{}: {message}", .path.display(), at_suffix(.json_path))]
    Parse {
        path: PathBuf,
        json_path: String,
        message: String,
    },
    #[error("invalid world config '{}' at {field}: expected {expected}", .path.display())]
    Invalid {
        path: PathBuf,
        field: &'static str,
        expected: &'static str,
    },
}

fn at_suffix(json_path: &str) -> String {
    if json_path.is_empty() || json_path == "." {
        String::new()
    } else {
        format!(" at {json_path}")
    }
}

/// Loads `<dir>/world.json`, falling back to defaults when the file does not exist.
pub(crate) fn load_world_config(
    dir: &Path,
) -> Result<(WorldConfig, ConfigSource), WorldConfigError> {
    let path = dir.join(WORLD_CONFIG_FILE);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "world_config_defaults");
            return Ok((WorldConfig::default(), ConfigSource::Defaults));
        }
        Err(source) => return Err(WorldConfigError::Read { path, source }),
    };

    let config = parse_world_config(&raw, &path)?;
    validate_world_config(&config, &path)?;
    info!(path = %path.display(), "world_config_loaded");
    Ok((config, ConfigSource::File))
}

fn parse_world_config(raw: &str, path: &Path) -> Result<WorldConfig, WorldConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, WorldConfig>(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        WorldConfigError::Parse {
            path: path.to_path_buf(),
            json_path,
            message: error.into_inner().to_string(),
        }
    })
}

fn validate_world_config(config: &WorldConfig, path: &Path) -> Result<(), WorldConfigError> {
    let invalid = |field: &'static str, expected: &'static str| WorldConfigError::Invalid {
        path: path.to_path_buf(),
        field,
        expected,
    };

    let points = [
        ("shrine", config.shrine),
        ("village", config.village),
        ("elder", config.elder),
        ("player_spawn", config.player_spawn),
    ];
    for (field, point) in points {
        if !point.is_finite() {
            return Err(invalid(field, "finite coordinates"));
        }
    }
    if !config.ground_height.is_finite() {
        return Err(invalid("ground_height", "finite number"));
    }
    if !(config.player_speed.is_finite() && config.player_speed > 0.0) {
        return Err(invalid("player_speed", "finite number > 0"));
    }
    if !(config.vertical_speed.is_finite() && config.vertical_speed > 0.0) {
        return Err(invalid("vertical_speed", "finite number > 0"));
    }
    Ok(())
}
