//! Recorded device input, replayed one frame per cycle.
//!
//! ```yaml
//! version: 1
//! frames:
//!   - driver: { buttons: [8], axes: { 1: -0.5 } }
//!     repeat: 10
//!   - co_driver: { buttons: [5, 1], pov: 180 }
//! ```
//!
//! A device missing from a frame is idle for that frame.

use std::path::Path;

use ahash::AHashMap;
use opshift_device::{DeviceFrame, AXIS_COUNT, BUTTON_COUNT, POV_CENTERED};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse trace: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported trace version: {0}")]
    UnsupportedVersion(u8),
    #[error("frame {frame}: button {button} is outside 1..={max}", max = BUTTON_COUNT)]
    ButtonOutOfRange { frame: usize, button: u8 },
    #[error("frame {frame}: axis {axis} is outside 0..{max}", max = AXIS_COUNT)]
    AxisOutOfRange { frame: usize, axis: u8 },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TraceV1 {
    version: u8,
    #[serde(default)]
    frames: Vec<TraceV1Frame>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TraceV1Frame {
    #[serde(default)]
    repeat: Option<u32>,
    #[serde(default)]
    driver: Option<TraceV1Device>,
    #[serde(default)]
    co_driver: Option<TraceV1Device>,
    #[serde(default)]
    sensor: Option<TraceV1Device>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TraceV1Device {
    #[serde(default)]
    buttons: Vec<u8>,
    #[serde(default)]
    pov: Option<i32>,
    #[serde(default)]
    axes: AHashMap<u8, f64>,
}

/// Device state held for `repeat` cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceFrame {
    pub repeat: u32,
    pub driver: DeviceFrame,
    pub co_driver: DeviceFrame,
    pub sensor: DeviceFrame,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    frames: Vec<TraceFrame>,
}

impl Trace {
    pub fn parse(input: &str) -> Result<Self, TraceError> {
        let raw: TraceV1 = serde_yaml::from_str(input)?;
        if raw.version != 1 {
            return Err(TraceError::UnsupportedVersion(raw.version));
        }

        let frames = raw
            .frames
            .into_iter()
            .enumerate()
            .map(|(index, frame)| {
                Ok::<_, TraceError>(TraceFrame {
                    repeat: frame.repeat.unwrap_or(1),
                    driver: device_frame(index, frame.driver.as_ref())?,
                    co_driver: device_frame(index, frame.co_driver.as_ref())?,
                    sensor: device_frame(index, frame.sensor.as_ref())?,
                })
            })
            .collect::<Result<Vec<_>, TraceError>>()?;
        Ok(Self { frames })
    }

    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let input = std::fs::read_to_string(path)?;
        Self::parse(&input)
    }

    pub fn frames(&self) -> &[TraceFrame] {
        &self.frames
    }

    /// Total number of cycles the trace spans.
    pub fn cycles(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.repeat)).sum()
    }

    /// The frame of every cycle, repeats expanded.
    pub fn iter_cycles(&self) -> impl Iterator<Item = &TraceFrame> + '_ {
        self.frames
            .iter()
            .flat_map(|frame| std::iter::repeat(frame).take(frame.repeat as usize))
    }
}

fn device_frame(index: usize, raw: Option<&TraceV1Device>) -> Result<DeviceFrame, TraceError> {
    let mut frame = DeviceFrame::default();
    let Some(raw) = raw else {
        return Ok(frame);
    };

    for &button in &raw.buttons {
        if !(1..=BUTTON_COUNT).contains(&button) {
            return Err(TraceError::ButtonOutOfRange {
                frame: index,
                button,
            });
        }
        frame.set_button(button, true);
    }
    for (&axis, &value) in &raw.axes {
        if axis >= AXIS_COUNT {
            return Err(TraceError::AxisOutOfRange { frame: index, axis });
        }
        frame.set_axis(axis, value);
    }
    frame.pov = raw.pov.unwrap_or(POV_CENTERED);
    Ok(frame)
}
