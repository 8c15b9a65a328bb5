//! Engine configuration
//!
//! [`EngineConfig`] gathers everything a [`crate::Terminal3270`] needs at
//! construction: screen geometry, address encoding, buffer capacities,
//! graphic-escape conversion and logging. It serializes to JSON and can be
//! loaded from a platform-appropriate default location.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::lib3270::address::AddressMode;
use crate::lib3270::display::ScreenSize;
use crate::logging::LoggingConfig;
use crate::protocol_common::charset::{CharacterSet, ConverterConfig};

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "TN3270R_CONFIG";

/// Default external field storage size in bytes
pub const DEFAULT_FIELD_STORAGE_CAPACITY: usize = 4096;

/// Default incremental parser buffer size in bytes
pub const DEFAULT_STREAM_BUFFER_CAPACITY: usize = 16384;

/// Configuration for one protocol engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Screen model or custom geometry
    pub screen_size: ScreenSize,
    /// Two-byte buffer address encoding
    pub address_mode: AddressMode,
    /// Bytes of external field storage (0 keeps field content inline)
    pub field_storage_capacity: usize,
    /// Bytes the incremental parser may buffer
    pub stream_buffer_capacity: usize,
    /// Conversion applied to graphic-escaped characters
    pub converter: ConverterConfig,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            screen_size: ScreenSize::Model2,
            address_mode: AddressMode::RowMajor,
            field_storage_capacity: DEFAULT_FIELD_STORAGE_CAPACITY,
            stream_buffer_capacity: DEFAULT_STREAM_BUFFER_CAPACITY,
            converter: ConverterConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn invalid(parameter: &str, value: impl ToString, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

impl EngineConfig {
    /// Check the configuration for values the engine cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        let rows = self.screen_size.rows();
        let cols = self.screen_size.cols();
        if rows == 0 || cols == 0 {
            return Err(invalid(
                "screen_size",
                format!("{rows}x{cols}"),
                "rows and columns must be non-zero",
            ));
        }

        let max = self.address_mode.max_buffer_size();
        if self.screen_size.buffer_size() > max {
            return Err(invalid(
                "screen_size",
                format!("{rows}x{cols}"),
                format!("{:?} addressing covers at most {max} cells", self.address_mode),
            ));
        }

        if self.stream_buffer_capacity == 0 {
            return Err(invalid("stream_buffer_capacity", 0, "must be non-zero"));
        }

        if self.converter.source == CharacterSet::Ebcdic || self.converter.target == CharacterSet::Ebcdic {
            return Err(invalid(
                "converter",
                format!("{} -> {}", self.converter.source, self.converter.target),
                "EBCDIC is handled by the EBCDIC codec, not the converter",
            ));
        }

        self.logging.level_filter()?;
        Ok(())
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Write the configuration, creating parent directories as needed
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        fs::write(path, self.to_json()?).map_err(io_err)
    }

    /// Load from [`default_config_path`], falling back to defaults
    pub fn load_or_default() -> Self {
        let path = default_config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Determine a platform-appropriate default config file path.
/// Priority:
/// 1) TN3270R_CONFIG env var
/// 2) Platform config dir (XDG on Linux, Application Support on macOS, %APPDATA% on Windows)
/// 3) Current directory fallback: ./engine.json
pub fn default_config_path() -> PathBuf {
    if let Ok(p) = std::env::var(CONFIG_ENV_VAR) {
        return PathBuf::from(p);
    }

    dirs::config_dir()
        .map(|base| base.join("tn3270r").join("engine.json"))
        .unwrap_or_else(|| PathBuf::from("engine.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol_common::charset::ErrorMode;

    #[test]
    fn test_default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.screen_size, ScreenSize::Model2);
        assert_eq!(config.address_mode, AddressMode::RowMajor);
        assert_eq!(config.field_storage_capacity, DEFAULT_FIELD_STORAGE_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let config = EngineConfig {
            screen_size: ScreenSize::Custom { rows: 10, cols: 40 },
            address_mode: AddressMode::Legacy14Bit,
            converter: ConverterConfig {
                source: CharacterSet::Apl,
                target: CharacterSet::Latin1,
                error_mode: ErrorMode::Skip,
            },
            ..EngineConfig::default()
        };

        let json = config.to_json().expect("Serialization should work");
        assert!(json.contains("legacy14_bit"));
        let back = EngineConfig::from_json(&json).expect("Deserialization should work");
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "screen_size": "Model5" }"#).unwrap();
        assert_eq!(config.screen_size, ScreenSize::Model5);
        assert_eq!(config.stream_buffer_capacity, DEFAULT_STREAM_BUFFER_CAPACITY);
    }

    #[test]
    fn test_validation_failures() {
        let zero = EngineConfig {
            screen_size: ScreenSize::Custom { rows: 0, cols: 80 },
            ..EngineConfig::default()
        };
        assert!(zero.validate().is_err());

        // 43x80 = 3440 fits 12-bit; 27x132 = 3564 fits; 255x255 does not
        let too_big = EngineConfig {
            screen_size: ScreenSize::Custom { rows: 255, cols: 255 },
            address_mode: AddressMode::Legacy12Bit,
            ..EngineConfig::default()
        };
        assert!(matches!(too_big.validate(), Err(ConfigError::InvalidParameter { .. })));

        let ebcdic = EngineConfig {
            converter: ConverterConfig {
                source: CharacterSet::Ebcdic,
                target: CharacterSet::Ascii,
                error_mode: ErrorMode::Replace,
            },
            ..EngineConfig::default()
        };
        assert!(ebcdic.validate().is_err());

        assert!(matches!(EngineConfig::from_json("{ not json"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("engine.json");

        let config = EngineConfig {
            screen_size: ScreenSize::Model4,
            field_storage_capacity: 0,
            ..EngineConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("Recovery:"));
    }
}
