use crate::params::{ParamError, SceneParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading a scene configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid initial parameters: {0}")]
    Invalid(#[from] ParamError),
}

/// Names of the two shader stages the viewport quad is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShaderNames {
    pub vertex: String,
    pub fragment: String,
}

impl Default for ShaderNames {
    fn default() -> Self {
        Self {
            vertex: "basic.vs".into(),
            fragment: "flat.fs".into(),
        }
    }
}

/// Startup configuration. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Origin shader names are resolved against: a directory or an http(s) URL.
    pub shader_base: String,
    pub shaders: ShaderNames,
    /// Directory holding textures.
    pub data_dir: PathBuf,
    pub window_width: u32,
    pub window_height: u32,
    /// Initial GUI values.
    pub params: SceneParams,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            shader_base: "./data/shaders/".into(),
            shaders: ShaderNames::default(),
            data_dir: PathBuf::from("./data"),
            window_width: 1280,
            window_height: 720,
            params: SceneParams::default(),
        }
    }
}

impl SceneConfig {
    /// Load a configuration file and validate the initial parameters.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(file)?;
        config.params.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "loaded scene config");
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.shaders.vertex, "basic.vs");
        assert_eq!(config.shaders.fragment, "flat.fs");
        assert_eq!(config.shader_base, "./data/shaders/");
    }

    #[test]
    fn load_partial_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{ "shader_base": "https://example.org/shaders", "params": {{ "ior": 1.5 }} }}"#
        )
        .unwrap();

        let config = SceneConfig::load(tmp.path()).unwrap();
        assert_eq!(config.shader_base, "https://example.org/shaders");
        assert_eq!(config.params.ior, 1.5);
        assert_eq!(config.window_width, 1280);
    }

    #[test]
    fn rejects_out_of_range_params() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, r#"{{ "params": {{ "exposure": 3.0 }} }}"#).unwrap();
        assert!(matches!(
            SceneConfig::load(tmp.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, r#"{{ "fog_density": 0.2 }}"#).unwrap();
        assert!(matches!(SceneConfig::load(tmp.path()), Err(ConfigError::Json(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            SceneConfig::load_or_default(Some(&missing)),
            Err(ConfigError::Io(_))
        ));
        assert!(SceneConfig::load_or_default(None).is_ok());
    }
}
