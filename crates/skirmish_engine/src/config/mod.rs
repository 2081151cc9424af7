//! Configuration system
//!
//! Engine and physics settings are plain serde structs that can be loaded from
//! TOML or RON. Values are validated once at load time so the hot path never
//! has to re-check them.

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            Self::from_ron_str(&contents)
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Parse configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from RON text
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value parsed fine but is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # Physics Configuration
///
/// Tuning for the broad phase, the continuous narrow phase and the impulse
/// resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Side length of one spatial grid cell in world units
    pub cell_size: f32,
    /// Extra padding added around swept AABBs
    pub aabb_margin: f32,
    /// Bisection stops once the time bracket is narrower than this (seconds)
    pub toi_tolerance: f32,
    /// Hard cap on bisection iterations
    pub toi_max_iterations: u32,
    /// Upper bound on the number of samples used to bracket a time of impact
    pub max_substeps: u32,
    /// Penetration tolerated before position correction kicks in
    pub penetration_slop: f32,
    /// Fraction of the excess penetration removed per frame
    pub baumgarte: f32,
    /// Mass assumed for dynamic bodies without a `Mass` component
    pub default_mass: f32,
}

impl PhysicsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if !(self.aabb_margin.is_finite() && self.aabb_margin >= 0.0) {
            return Err(ConfigError::Invalid("aabb_margin must be non-negative".to_string()));
        }
        if !(self.toi_tolerance.is_finite() && self.toi_tolerance > 0.0) {
            return Err(ConfigError::Invalid("toi_tolerance must be positive".to_string()));
        }
        if self.toi_max_iterations == 0 {
            return Err(ConfigError::Invalid("toi_max_iterations must be at least 1".to_string()));
        }
        if self.max_substeps == 0 {
            return Err(ConfigError::Invalid("max_substeps must be at least 1".to_string()));
        }
        if !(self.penetration_slop.is_finite() && self.penetration_slop >= 0.0) {
            return Err(ConfigError::Invalid("penetration_slop must be non-negative".to_string()));
        }
        if !(0.0..=1.0).contains(&self.baumgarte) {
            return Err(ConfigError::Invalid(format!(
                "baumgarte must be within [0, 1], got {}",
                self.baumgarte
            )));
        }
        if !(self.default_mass.is_finite() && self.default_mass > 0.0) {
            return Err(ConfigError::Invalid("default_mass must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            cell_size: 64.0,
            aabb_margin: 0.5,
            toi_tolerance: 1.0e-5,
            toi_max_iterations: 24,
            max_substeps: 64,
            penetration_slop: 0.01,
            baumgarte: 0.8,
            default_mass: 1.0,
        }
    }
}

impl Config for PhysicsConfig {}

/// # Engine Configuration
///
/// Core engine behavior: logging, profiling and the physics block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Collect per-system timings in the scheduler
    pub profiling: bool,
    /// Collision and response tuning
    pub physics: PhysicsConfig,
}

impl EngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
        if !LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!("Unknown log level: {}", self.log_level)));
        }
        self.physics.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            profiling: false,
            physics: PhysicsConfig::default(),
        }
    }
}

impl Config for EngineConfig {}
