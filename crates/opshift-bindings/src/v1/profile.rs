use ahash::AHashMap;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BindingsV1 {
    pub version: u8,
    #[serde(default)]
    pub allow_overlapping_macros: bool,
    #[serde(default)]
    pub shifts: AHashMap<String, BindingsV1Shift>, // shift -> trigger
    #[serde(default)]
    pub operations: AHashMap<String, BindingsV1Operation>, // operation -> binding
    #[serde(default)]
    pub macros: Vec<BindingsV1Macro>, // declaration order is activation priority
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BindingsV1AxisRange {
    pub axis: u8,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BindingsV1Shift {
    pub device: String,
    #[serde(default)]
    pub button: Option<u8>,
    #[serde(default)]
    pub pov: Option<i32>,
    #[serde(default)]
    pub axis_range: Option<BindingsV1AxisRange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BindingsV1Operation {
    #[serde(default)]
    pub device: Option<String>, // none | driver | co_driver | sensor
    #[serde(default)]
    pub kind: Option<String>, // digital | analog, for bindings without input
    // digital
    #[serde(default)]
    pub button: Option<u8>,
    #[serde(default)]
    pub pov: Option<i32>,
    #[serde(default)]
    pub axis_range: Option<BindingsV1AxisRange>,
    #[serde(default)]
    pub mode: Option<String>, // simple | click | toggle
    // analog
    #[serde(default)]
    pub axis: Option<u8>,
    #[serde(default)]
    pub invert: Option<bool>,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub deadzone: Option<f64>,
    #[serde(default)]
    pub shifts: Option<String>, // "alt + !debug"
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BindingsV1Macro {
    pub operation: String,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub button: Option<u8>,
    #[serde(default)]
    pub pov: Option<i32>,
    #[serde(default)]
    pub axis_range: Option<BindingsV1AxisRange>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub shifts: Option<String>,
    pub affects: Vec<String>,
    #[serde(default)]
    pub script: Vec<BindingsV1Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BindingsV1Step {
    pub cycles: u32,
    #[serde(default)]
    pub set: AHashMap<String, serde_yaml::Value>, // operation -> bool | number
}
