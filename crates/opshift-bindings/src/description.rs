use std::fmt;

use opshift_bit_mask::{Bitmask, Key};
use opshift_device::DeviceRef;
use smallvec::SmallVec;

/// How a digital binding turns its raw signal into an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonMode {
    /// Output follows the raw input.
    #[default]
    Simple,
    /// Output is true for the single cycle of a false to true edge.
    Click,
    /// Output flips on each false to true edge.
    Toggle,
}

/// The raw signal a digital binding reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DigitalInput {
    /// A 1-based button index.
    Button(u8),
    /// Pressed while the POV hat reads exactly this angle.
    Pov(i32),
    /// Pressed while the axis value lies within `[min, max]`.
    AxisRange { axis: u8, min: f64, max: f64 },
}

/// Shift conditions of a binding.
///
/// A binding is eligible iff every required shift is active and no forbidden
/// shift is. Empty conditions are always eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShiftConditions<S: Key> {
    required: Bitmask<S>,
    forbidden: Bitmask<S>,
}

impl<S: Key> Default for ShiftConditions<S> {
    fn default() -> Self {
        Self::none()
    }
}

impl<S: Key> ShiftConditions<S> {
    pub const fn none() -> Self {
        Self {
            required: Bitmask::empty(),
            forbidden: Bitmask::empty(),
        }
    }

    #[must_use]
    pub fn require(mut self, shift: S) -> Self {
        self.required.insert(shift);
        self
    }

    #[must_use]
    pub fn forbid(mut self, shift: S) -> Self {
        self.forbidden.insert(shift);
        self
    }

    pub fn required(&self) -> Bitmask<S> {
        self.required
    }

    pub fn forbidden(&self) -> Bitmask<S> {
        self.forbidden
    }

    /// Every shift mentioned by the conditions.
    pub fn shifts(&self) -> Bitmask<S> {
        self.required.union(&self.forbidden)
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.forbidden.is_empty()
    }

    #[inline]
    pub fn is_eligible(&self, active: &Bitmask<S>) -> bool {
        self.required.is_subset(active) && !self.forbidden.intersects(active)
    }
}

/// Binds a shift to the raw signal that activates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftDescription<S: Key> {
    pub shift: S,
    pub device: DeviceRef,
    pub input: DigitalInput,
}

impl<S: Key> ShiftDescription<S> {
    pub fn button(shift: S, device: DeviceRef, button: u8) -> Self {
        Self {
            shift,
            device,
            input: DigitalInput::Button(button),
        }
    }

    pub fn pov(shift: S, device: DeviceRef, angle: i32) -> Self {
        Self {
            shift,
            device,
            input: DigitalInput::Pov(angle),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigitalDescription<S: Key> {
    pub device: DeviceRef,
    /// `None` only together with [`DeviceRef::None`].
    pub input: Option<DigitalInput>,
    pub mode: ButtonMode,
    pub conditions: ShiftConditions<S>,
}

impl<S: Key> DigitalDescription<S> {
    pub fn new(device: DeviceRef, input: DigitalInput, mode: ButtonMode) -> Self {
        Self {
            device,
            input: Some(input),
            mode,
            conditions: ShiftConditions::none(),
        }
    }

    pub fn button(device: DeviceRef, button: u8, mode: ButtonMode) -> Self {
        Self::new(device, DigitalInput::Button(button), mode)
    }

    pub fn pov(device: DeviceRef, angle: i32, mode: ButtonMode) -> Self {
        Self::new(device, DigitalInput::Pov(angle), mode)
    }

    /// A binding no input drives; only macros set its value.
    pub fn unbound() -> Self {
        Self {
            device: DeviceRef::None,
            input: None,
            mode: ButtonMode::Simple,
            conditions: ShiftConditions::none(),
        }
    }

    #[must_use]
    pub fn with_conditions(mut self, conditions: ShiftConditions<S>) -> Self {
        self.conditions = conditions;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalogDescription<S: Key> {
    pub device: DeviceRef,
    /// `None` only together with [`DeviceRef::None`].
    pub axis: Option<u8>,
    pub invert: bool,
    pub multiplier: f64,
    /// Readings with a magnitude below this are reported as 0.0.
    pub deadzone: f64,
    pub conditions: ShiftConditions<S>,
}

impl<S: Key> AnalogDescription<S> {
    pub fn axis(device: DeviceRef, axis: u8) -> Self {
        Self {
            device,
            axis: Some(axis),
            invert: false,
            multiplier: 1.0,
            deadzone: 0.0,
            conditions: ShiftConditions::none(),
        }
    }

    pub fn unbound() -> Self {
        Self {
            device: DeviceRef::None,
            axis: None,
            ..Self::axis(DeviceRef::None, 0)
        }
    }

    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_deadzone(mut self, deadzone: f64) -> Self {
        self.deadzone = deadzone;
        self
    }

    #[must_use]
    pub fn with_conditions(mut self, conditions: ShiftConditions<S>) -> Self {
        self.conditions = conditions;
        self
    }

    /// Applies deadzone, inversion and scaling to a raw axis reading.
    ///
    /// Outside the deadzone the remaining travel is rescaled, so the output
    /// still spans the full range instead of jumping from 0 to `deadzone`.
    pub fn shape(&self, raw: f64) -> f64 {
        let magnitude = raw.abs();
        let value = if magnitude <= self.deadzone {
            0.0
        } else if self.deadzone > 0.0 {
            let scaled = ((magnitude - self.deadzone) / (1.0 - self.deadzone)).clamp(0.0, 1.0);
            scaled.copysign(raw)
        } else {
            raw
        };
        let value = if self.invert { -value } else { value };
        value * self.multiplier
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Digital,
    Analog,
}

/// The static binding of one operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperationDescription<S: Key> {
    Digital(DigitalDescription<S>),
    Analog(AnalogDescription<S>),
}

impl<S: Key> OperationDescription<S> {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationDescription::Digital(_) => OperationKind::Digital,
            OperationDescription::Analog(_) => OperationKind::Analog,
        }
    }

    pub fn device(&self) -> DeviceRef {
        match self {
            OperationDescription::Digital(d) => d.device,
            OperationDescription::Analog(a) => a.device,
        }
    }

    pub fn conditions(&self) -> &ShiftConditions<S> {
        match self {
            OperationDescription::Digital(d) => &d.conditions,
            OperationDescription::Analog(a) => &a.conditions,
        }
    }

    fn has_input(&self) -> bool {
        match self {
            OperationDescription::Digital(d) => d.input.is_some(),
            OperationDescription::Analog(a) => a.axis.is_some(),
        }
    }

    /// Whether device and input agree: both present or both absent.
    pub(crate) fn is_wired_consistently(&self) -> bool {
        (self.device() == DeviceRef::None) != self.has_input()
    }
}

/// A resolved operation value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Digital(bool),
    Analog(f64),
}

impl Value {
    /// The value an operation holds when nothing drives it.
    pub const fn neutral(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Digital => Value::Digital(false),
            OperationKind::Analog => Value::Analog(0.0),
        }
    }

    pub const fn kind(&self) -> OperationKind {
        match self {
            Value::Digital(_) => OperationKind::Digital,
            Value::Analog(_) => OperationKind::Analog,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Digital(v) => Some(*v),
            Value::Analog(_) => None,
        }
    }

    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Analog(v) => Some(*v),
            Value::Digital(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Digital(v) => write!(f, "{v}"),
            Value::Analog(v) => write!(f, "{v:.3}"),
        }
    }
}

/// One step of a scripted macro: hold `values` for `cycles` cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep<O: Key> {
    pub cycles: u32,
    pub values: SmallVec<[(O, Value); 4]>,
}

impl<O: Key> ScriptStep<O> {
    pub fn new(cycles: u32) -> Self {
        Self {
            cycles,
            values: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, operation: O, value: Value) -> Self {
        self.values.push((operation, value));
        self
    }

    pub fn value(&self, operation: O) -> Option<Value> {
        self.values
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, value)| *value)
    }
}

/// The static binding of a macro-capable operation.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDescription<O: Key, S: Key> {
    /// The input that starts (and, depending on the mode, cancels) the macro.
    pub trigger: DigitalDescription<S>,
    /// Operations the macro owns while it runs.
    pub affected: Bitmask<O>,
    /// Steps for the scripted task, empty when the task comes from elsewhere.
    pub script: Vec<ScriptStep<O>>,
}

impl<O: Key, S: Key> MacroDescription<O, S> {
    pub fn new(trigger: DigitalDescription<S>, affected: &[O]) -> Self {
        Self {
            trigger,
            affected: Bitmask::new(affected),
            script: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_step(mut self, step: ScriptStep<O>) -> Self {
        self.script.push(step);
        self
    }
}
