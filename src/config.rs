//! Process-wide tunables (§3, §9), loaded once at startup rather than kept
//! as mutable globals. Owned by whatever constructs a [`crate::pod::Pod`]
//! and threaded by reference into the [`crate::leg::Leg`] operations that
//! need them.

use crate::error::PodResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// Swing arc peak height.
    pub z_lift: f64,
    /// Revert-to-neutral arc peak height.
    pub revert_lift: f64,
    /// Delay counter driving tick cadence, 0..9 (§6 "set speed").
    pub tick_delay_counter: u8,
    pub pods_directory: PathBuf,
    pub primitives_directory: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            z_lift: 50.0,
            revert_lift: 20.0,
            tick_delay_counter: 3,
            pods_directory: PathBuf::from("pods"),
            primitives_directory: PathBuf::from("primitives"),
        }
    }
}

/// Loads an [`EngineConfig`] from an optional layered settings file, falling
/// back to [`EngineConfig::default`] for anything the file doesn't specify.
/// No environment-variable layer is installed, per §6: the engine takes no
/// input from the environment.
pub fn load(settings_path: Option<&Path>) -> PodResult<EngineConfig> {
    let mut builder = config::Config::builder()
        .set_default("z_lift", 50.0)?
        .set_default("revert_lift", 20.0)?
        .set_default("tick_delay_counter", 3)?
        .set_default("pods_directory", "pods")?
        .set_default("primitives_directory", "primitives")?;

    if let Some(path) = settings_path {
        builder = builder.add_source(config::File::from(path).required(false));
    }

    let settings = builder.build()?;
    Ok(settings.try_deserialize()?)
}

/// Ensures the `pods/`/`primitives/` directory roots named in §6 exist.
pub fn ensure_directories(config: &EngineConfig) -> std::io::Result<()> {
    std::fs::create_dir_all(&config.pods_directory)?;
    std::fs::create_dir_all(&config.primitives_directory)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_match_reference_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.z_lift, 50.0);
        assert_eq!(config.revert_lift, 20.0);
    }

    #[test]
    fn missing_settings_file_is_not_an_error() {
        let config = load(Some(Path::new("does/not/exist.toml"))).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
