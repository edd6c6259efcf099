use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub stage: StageConfig,
    #[serde(default)]
    pub carousel: CarouselConfig,
    #[serde(default)]
    pub derivation: DerivationConfig,
    #[serde(default)]
    pub content: ContentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Fail fast on invariant violations instead of degrading
    #[serde(default = "default_strict_invariants")]
    pub strict_invariants: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            strict_invariants: default_strict_invariants(),
        }
    }
}

/// Raw input normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Accumulator units per wheel deltaY pixel
    #[serde(default = "default_wheel_sensitivity")]
    pub wheel_sensitivity: f64,
    /// Accumulator units per touch pixel travelled
    #[serde(default = "default_touch_sensitivity")]
    pub touch_sensitivity: f64,
    /// Minimum flick speed in px/ms for a discrete index step
    #[serde(default = "default_flick_velocity_threshold")]
    pub flick_velocity_threshold: f64,
    /// Minimum flick distance in px for a discrete index step
    #[serde(default = "default_flick_distance_threshold")]
    pub flick_distance_threshold: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            wheel_sensitivity: default_wheel_sensitivity(),
            touch_sensitivity: default_touch_sensitivity(),
            flick_velocity_threshold: default_flick_velocity_threshold(),
            flick_distance_threshold: default_flick_distance_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Fraction of the remaining distance covered per frame, in (0, 1]
    #[serde(default = "default_smoothing_factor")]
    pub smoothing_factor: f64,
    /// Distance under which the rendered value snaps onto the target
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Frame rate of the tick loop
    #[serde(default = "default_animation_fps")]
    pub animation_fps: u32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: default_smoothing_factor(),
            epsilon: default_epsilon(),
            animation_fps: default_animation_fps(),
        }
    }
}

/// Stage thresholds.
///
/// The reveal threshold and the chrome hide/show pair are deliberately
/// independent knobs; they drive different observers of the same progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Progress at which Initial becomes Revealed
    #[serde(default = "default_reveal_threshold")]
    pub reveal_threshold: f64,
    /// Progress at or beyond which downward motion hides the chrome
    #[serde(default = "default_chrome_hide_threshold")]
    pub chrome_hide_threshold: f64,
    /// Progress at or below which upward motion restores the chrome
    #[serde(default = "default_chrome_show_threshold")]
    pub chrome_show_threshold: f64,
    /// Duration of programmatic progress snaps
    #[serde(default = "default_snap_duration")]
    pub snap_duration_ms: u64,
    /// Easing used by programmatic progress snaps
    #[serde(default)]
    pub snap_easing: EasingType,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            reveal_threshold: default_reveal_threshold(),
            chrome_hide_threshold: default_chrome_hide_threshold(),
            chrome_show_threshold: default_chrome_show_threshold(),
            snap_duration_ms: default_snap_duration(),
            snap_easing: EasingType::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselConfig {
    /// Settle time after an index change, matching the visual transition
    #[serde(default = "default_settle_duration")]
    pub settle_duration_ms: u64,
    /// Request detail content whenever the active index changes
    #[serde(default = "default_true")]
    pub prefetch_on_index_change: bool,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            settle_duration_ms: default_settle_duration(),
            prefetch_on_index_change: default_true(),
        }
    }
}

/// Easing curve applied to a normalized progress value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingType {
    Linear,
    /// Cubic ease-out, 1 - (1-t)^3
    Cubic,
    /// Cubic ease-in-out, symmetric around t = 0.5
    EaseInOut,
    /// Exponential ease-out, 1 - 2^(-10t)
    #[default]
    EaseOut,
}

/// Shape of a single derived render parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Curve {
    /// Rest value 0 below `threshold`, `max_magnitude * easing(progress)` at or above it
    Offset {
        threshold: f64,
        max_magnitude: f64,
        #[serde(default)]
        easing: EasingType,
    },
    /// Linear fade from 1 towards 0, fully hidden at or beyond `hide_threshold`
    FadeOut { hide_threshold: f64, fade_speed: f64 },
    /// Hidden below `reveal_threshold`, linear fade-in above it
    FadeIn { reveal_threshold: f64, fade_speed: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(flatten)]
    pub curve: Curve,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, curve: Curve) -> Self {
        Self {
            name: name.into(),
            curve,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationConfig {
    #[serde(default = "default_parameters")]
    pub parameters: Vec<ParameterSpec>,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            parameters: default_parameters(),
        }
    }
}

/// Where content records come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSourceKind {
    #[default]
    Static,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default)]
    pub source: ContentSourceKind,
    /// JSON file for the static source
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Base URL of the content service for the http source
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            source: ContentSourceKind::default(),
            path: None,
            base_url: None,
            request_timeout_secs: default_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_strict_invariants() -> bool {
    cfg!(debug_assertions)
}

fn default_true() -> bool {
    true
}

fn default_wheel_sensitivity() -> f64 {
    0.12 // one 100px wheel notch = 12 units
}

fn default_touch_sensitivity() -> f64 {
    0.25
}

fn default_flick_velocity_threshold() -> f64 {
    0.5
}

fn default_flick_distance_threshold() -> f64 {
    50.0
}

fn default_smoothing_factor() -> f64 {
    0.12
}

fn default_epsilon() -> f64 {
    0.0005
}

fn default_animation_fps() -> u32 {
    60
}

fn default_reveal_threshold() -> f64 {
    0.03
}

fn default_chrome_hide_threshold() -> f64 {
    0.6
}

fn default_chrome_show_threshold() -> f64 {
    0.3
}

fn default_snap_duration() -> u64 {
    600
}

fn default_settle_duration() -> u64 {
    700
}

fn default_timeout() -> u64 {
    30
}

fn default_parameters() -> Vec<ParameterSpec> {
    vec![
        ParameterSpec::new(
            "title_offset",
            Curve::Offset {
                threshold: 0.0,
                max_magnitude: -120.0,
                easing: EasingType::EaseOut,
            },
        ),
        ParameterSpec::new(
            "secondary_offset",
            Curve::Offset {
                threshold: 0.03,
                max_magnitude: -60.0,
                easing: EasingType::EaseOut,
            },
        ),
        ParameterSpec::new(
            "title_opacity",
            Curve::FadeOut {
                hide_threshold: 0.6,
                fade_speed: 2.5,
            },
        ),
        ParameterSpec::new(
            "element_opacity",
            Curve::FadeIn {
                reveal_threshold: 0.03,
                fade_speed: 1.5,
            },
        ),
    ]
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

fn in_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from an explicit file
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, self.to_toml()?)?;

        Ok(())
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/stagehand/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("stagehand")
            .join("config.toml")
    }

    /// Static content file (with tilde expansion)
    pub fn content_path(&self) -> Option<PathBuf> {
        self.content.path.as_deref().map(expand_tilde)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        let err = |msg: String| Err(crate::Error::Config(msg));

        let factor = self.smoothing.smoothing_factor;
        if !(factor > 0.0 && factor <= 1.0) {
            return err(format!("smoothing_factor must be in (0, 1], got {}", factor));
        }
        if !(self.smoothing.epsilon > 0.0) {
            return err(format!("epsilon must be positive, got {}", self.smoothing.epsilon));
        }
        if !(self.input.wheel_sensitivity > 0.0) || !(self.input.touch_sensitivity > 0.0) {
            return err("input sensitivities must be positive".to_string());
        }

        let stage = &self.stage;
        for (name, value) in [
            ("reveal_threshold", stage.reveal_threshold),
            ("chrome_hide_threshold", stage.chrome_hide_threshold),
            ("chrome_show_threshold", stage.chrome_show_threshold),
        ] {
            if !in_unit_range(value) {
                return err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if stage.chrome_show_threshold >= stage.chrome_hide_threshold {
            return err(format!(
                "chrome_show_threshold ({}) must be below chrome_hide_threshold ({})",
                stage.chrome_show_threshold, stage.chrome_hide_threshold
            ));
        }

        for spec in &self.derivation.parameters {
            let speed = match spec.curve {
                Curve::Offset { .. } => continue,
                Curve::FadeOut { fade_speed, .. } | Curve::FadeIn { fade_speed, .. } => fade_speed,
            };
            if !(speed > 0.0) {
                return err(format!("{}: fade_speed must be positive", spec.name));
            }
        }

        if self.content.source == ContentSourceKind::Http && self.content.base_url.is_none() {
            return err("content.base_url is required for the http source".to_string());
        }

        Ok(())
    }
}
