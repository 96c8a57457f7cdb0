/// Run configuration for the surge warning service.
///
/// Loaded from a TOML file. The path comes from the command line, else the
/// `SURGEMON_CONFIG` environment variable (a `.env` file in the working
/// directory is honoured), else `surgemon.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::logging::LogLevel;
use crate::model::{Result, SurgeError};

pub const CONFIG_ENV_VAR: &str = "SURGEMON_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "surgemon.toml";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SurgeConfig {
    pub scope: ScopeConfig,
    pub inputs: InputConfig,
    #[serde(default)]
    pub search: SearchSettings,
    pub output: OutputConfig,
    #[serde(default)]
    pub event: EventConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which administrative unit one run covers.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Province name as it appears in the boundary files' NAME_1 field.
    pub province: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// ADCIRC grid (fort.14).
    pub mesh: PathBuf,
    /// ADCIRC maximum elevation output (maxele.63).
    pub max_elevation: PathBuf,
    /// ADCIRC elevation time series (fort.63). Onset scan is skipped without it.
    pub time_series: Option<PathBuf>,
    /// ADCIRC model parameters (fort.15), used for the reference time.
    pub model_parameters: Option<PathBuf>,
    /// Town boundaries (GeoJSON).
    pub towns: PathBuf,
    /// Barangay boundaries (GeoJSON).
    pub barangays: PathBuf,
    /// Province boundaries (GeoJSON). Needed for shoreline estimates and maps.
    pub provinces: Option<PathBuf>,
}

/// Tuning for the candidate search.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Added to the bounding radius on the first pass. The radius test is
    /// strict, so with zero a node sitting on the farthest vertex is missed.
    pub base_offset_m: f64,
    /// Added on top of the bounding radius for the retry pass.
    pub radius_offset_m: f64,
    /// Reach of the shoreline estimate around coastline vertices.
    pub shoreline_radius_m: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_offset_m: 1_000.0,
            radius_offset_m: 1_000.0,
            shoreline_radius_m: 1_000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Where `<scope>.neighbors` cache files live.
    pub neighbor_cache_dir: PathBuf,
    #[serde(default = "default_true")]
    pub kml: bool,
    #[serde(default)]
    pub geojson: bool,
}

/// Identifiers used in visualization file names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub typhoon_name: String,
    pub event_id: String,
    pub max_surge_id: String,
    /// Overrides the reference time found in fort.15.
    /// Accepts RFC 3339 or `YYYY-MM-DD HH:MM:SS` (UTC).
    pub reference_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: false,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Picks the config path: explicit argument, then environment, then default.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    dotenv::dotenv().ok();
    std::env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Reads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<SurgeConfig> {
    let text = fs::read_to_string(path).map_err(|e| SurgeError::io(path, e))?;
    parse_config(&text)
}

/// Parses and validates configuration text.
pub fn parse_config(text: &str) -> Result<SurgeConfig> {
    let config: SurgeConfig =
        toml::from_str(text).map_err(|e| SurgeError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

impl SurgeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scope.province.trim().is_empty() {
            return Err(SurgeError::Config("scope.province must not be empty".into()));
        }
        let s = &self.search;
        for (name, value) in [
            ("search.base_offset_m", s.base_offset_m),
            ("search.radius_offset_m", s.radius_offset_m),
            ("search.shoreline_radius_m", s.shoreline_radius_m),
        ] {
            if !(value >= 0.0) {
                return Err(SurgeError::Config(format!("{} must be >= 0, got {}", name, value)));
            }
        }
        if let Some(raw) = &self.event.reference_time {
            parse_reference_time(raw)?;
        }
        LogLevel::parse(&self.logging.level)
            .ok_or_else(|| SurgeError::Config(format!("unknown log level '{}'", self.logging.level)))?;
        Ok(())
    }

    /// Configured reference time override, if any.
    pub fn reference_time_override(&self) -> Result<Option<DateTime<Utc>>> {
        self.event
            .reference_time
            .as_deref()
            .map(parse_reference_time)
            .transpose()
    }
}

fn parse_reference_time(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| SurgeError::Config(format!("event.reference_time '{}': {}", raw, e)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MINIMAL: &str = r#"
        [scope]
        province = "Leyte"

        [inputs]
        mesh = "fort.14"
        max_elevation = "maxele.63"
        towns = "towns.geojson"
        barangays = "barangays.geojson"

        [output]
        directory = "out"
        neighbor_cache_dir = "neighbors"
    "#;

    #[test]
    fn test_minimal_config_takes_defaults() {
        let cfg = parse_config(MINIMAL).expect("minimal config should parse");
        assert_eq!(cfg.scope.province, "Leyte");
        assert_eq!(cfg.search, SearchSettings::default());
        assert!(cfg.output.kml);
        assert!(!cfg.output.geojson);
        assert!(cfg.inputs.time_series.is_none());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_example_config_in_repo_parses() {
        let text = include_str!("../surgemon.toml");
        let cfg = parse_config(text).expect("shipped example config should parse");
        assert!(cfg.inputs.time_series.is_some());
    }

    #[test]
    fn test_negative_offset_rejected() {
        let text = format!("{}\n[search]\nradius_offset_m = -5.0\n", MINIMAL);
        let err = parse_config(&text).expect_err("negative offset must fail");
        assert!(err.to_string().contains("radius_offset_m"));
    }

    #[test]
    fn test_empty_province_rejected() {
        let text = MINIMAL.replace("\"Leyte\"", "\"  \"");
        assert!(matches!(parse_config(&text), Err(SurgeError::Config(_))));
    }

    #[test]
    fn test_missing_section_is_config_error() {
        assert!(matches!(parse_config("[scope]\nprovince = \"X\"\n"), Err(SurgeError::Config(_))));
    }

    #[test]
    fn test_reference_time_formats() {
        let expected = Utc.with_ymd_and_hms(2013, 11, 6, 0, 0, 0).unwrap();
        assert_eq!(parse_reference_time("2013-11-06 00:00:00").unwrap(), expected);
        assert_eq!(parse_reference_time("2013-11-06T08:00:00+08:00").unwrap(), expected);
        assert!(parse_reference_time("yesterday").is_err());
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let p = resolve_config_path(Some(Path::new("/tmp/custom.toml")));
        assert_eq!(p, PathBuf::from("/tmp/custom.toml"));
    }
}
