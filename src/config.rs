use anyhow::{ensure, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub smooth: SmoothConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub extension: ExtensionConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmoothConfig {
    /// EMA の重み (0 < alpha <= 1)。大きいほど応答が速い。
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

/// 視点判定のしきい値 (両肩の深度差)
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// 外転: 深度差がこれ以下なら正面とみなす
    #[serde(default = "default_abduction_max_z_diff")]
    pub abduction_max_z_diff: f64,
    /// 屈曲・伸展: 深度差がこれ以上なら側面とみなす
    #[serde(default = "default_sagittal_min_z_diff")]
    pub sagittal_min_z_diff: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionConfig {
    /// 肘が肩より後方にあるとみなす最小深度差
    #[serde(default = "default_min_depth")]
    pub min_depth: f64,
    /// 腕がほぼ垂直のときの atan2 分母の下駄
    #[serde(default = "default_vertical_bias")]
    pub vertical_bias: f64,
    #[serde(default = "default_max_degrees")]
    pub max_degrees: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    /// 計測間隔 (ms)。50ms ≒ 20Hz
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_alpha() -> f64 { 0.2 }
fn default_abduction_max_z_diff() -> f64 { 0.12 }
fn default_sagittal_min_z_diff() -> f64 { 0.10 }
fn default_min_depth() -> f64 { 0.01 }
fn default_vertical_bias() -> f64 { 0.01 }
fn default_max_degrees() -> f64 { 50.0 }
fn default_interval_ms() -> u64 { 50 }
fn default_output_dir() -> String { "exports".to_string() }

impl Default for SmoothConfig {
    fn default() -> Self {
        Self { alpha: default_alpha() }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            abduction_max_z_diff: default_abduction_max_z_diff(),
            sagittal_min_z_diff: default_sagittal_min_z_diff(),
        }
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            min_depth: default_min_depth(),
            vertical_bias: default_vertical_bias(),
            max_degrees: default_max_degrees(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { interval_ms: default_interval_ms() }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { output_dir: default_output_dir() }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 読み込みに失敗したらデフォルト設定を使う
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}: {:#}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.smooth.alpha > 0.0 && self.smooth.alpha <= 1.0,
            "smooth.alpha must be in (0, 1], got {}",
            self.smooth.alpha
        );
        ensure!(
            self.extension.max_degrees > 0.0,
            "extension.max_degrees must be positive, got {}",
            self.extension.max_degrees
        );
        ensure!(
            self.extension.vertical_bias > 0.0,
            "extension.vertical_bias must be positive, got {}",
            self.extension.vertical_bias
        );
        Ok(())
    }
}
