use serde::{Deserialize, Serialize};

use crate::{DEFAULT_BAUD, DEFAULT_TIMEOUT_MS};

fn default_baud() -> u32 {
    DEFAULT_BAUD
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_reduction_ratio() -> f64 {
    1.0
}

/// Identifies one physical SLCAN gateway. Shape only: loading this from TOML
/// or JSON is a caller concern, not this crate's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud: default_baud(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// One axis's identity and unit conversion relative to its motor shaft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisConfig {
    pub motor_id: u8,
    #[serde(default = "default_reduction_ratio")]
    pub reduction_ratio: f64,
    #[serde(default = "default_direction_sign")]
    pub direction_sign: i8,
    #[serde(default)]
    pub label: Option<String>,
}

fn default_direction_sign() -> i8 {
    1
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            motor_id: 1,
            reduction_ratio: default_reduction_ratio(),
            direction_sign: default_direction_sign(),
            label: None,
        }
    }
}

/// A shared bus plus the axes that live on it (up to six for the arm case,
/// though this type does not itself enforce that cap).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmConfig {
    pub bus: BusConfig,
    #[serde(default)]
    pub axes: Vec<AxisConfig>,
}
