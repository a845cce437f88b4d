use ahash::AHashMap;
use opshift_bit_mask::{Bitmask, Key};
use opshift_device::DeviceRef;
use thiserror::Error;

use crate::description::{
    AnalogDescription, DigitalDescription, DigitalInput, MacroDescription,
    OperationDescription, ShiftConditions, ShiftDescription,
};

/// Binding mistakes detected before the controller starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("shift {0} must be bound to a device")]
    UnboundShiftDevice(&'static str),
    #[error("shift {0} is described more than once")]
    DuplicateShift(&'static str),
    #[error("operation {0} is bound more than once")]
    DuplicateOperation(&'static str),
    #[error("{0} must name both a device and an input, or neither")]
    InconsistentInput(&'static str),
    #[error("{0} has an empty axis range")]
    EmptyAxisRange(&'static str),
    #[error("{0} needs a deadzone in 0.0..1.0")]
    InvalidDeadzone(&'static str),
    #[error("{operation} both requires and forbids shift {shift}")]
    ConflictingCondition {
        operation: &'static str,
        shift: &'static str,
    },
    #[error("{operation} depends on shift {shift}, which has no description")]
    UndescribedShift {
        operation: &'static str,
        shift: &'static str,
    },
    #[error("macro {0} does not affect any operation")]
    EmptyMacro(&'static str),
    #[error("macro {macro_op} affects {operation}, which is not a bound operation")]
    UnknownAffected {
        macro_op: &'static str,
        operation: &'static str,
    },
    #[error("macro {macro_op} sets {operation} outside its affected operations")]
    ScriptOutsideAffected {
        macro_op: &'static str,
        operation: &'static str,
    },
    #[error("macro {macro_op} sets {operation} to a value of the wrong kind")]
    ScriptKindMismatch {
        macro_op: &'static str,
        operation: &'static str,
    },
    #[error("macros {first} and {second} affect overlapping operations")]
    OverlappingMacros {
        first: &'static str,
        second: &'static str,
    },
}

/// The validated, immutable binding table of a controller.
#[derive(Debug, Clone)]
pub struct Bindings<O: Key, S: Key> {
    shifts: Vec<ShiftDescription<S>>,
    operations: AHashMap<O, OperationDescription<S>>,
    macros: Vec<(O, MacroDescription<O, S>)>,
    allow_overlapping_macros: bool,
}

impl<O: Key, S: Key> Bindings<O, S> {
    pub fn builder() -> BindingsBuilder<O, S> {
        BindingsBuilder::default()
    }

    pub fn shifts(&self) -> &[ShiftDescription<S>] {
        &self.shifts
    }

    pub fn operations(&self) -> impl Iterator<Item = (O, &OperationDescription<S>)> {
        self.operations.iter().map(|(op, desc)| (*op, desc))
    }

    pub fn operation(&self, operation: O) -> Option<&OperationDescription<S>> {
        self.operations.get(&operation)
    }

    /// Macro bindings in activation priority order.
    pub fn macros(&self) -> &[(O, MacroDescription<O, S>)] {
        &self.macros
    }

    pub fn macro_description(&self, operation: O) -> Option<&MacroDescription<O, S>> {
        self.macros
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, desc)| desc)
    }

    pub fn allows_overlapping_macros(&self) -> bool {
        self.allow_overlapping_macros
    }

    /// Every device any binding reads from.
    pub fn devices(&self) -> Vec<DeviceRef> {
        let mut devices: Vec<DeviceRef> = self
            .shifts
            .iter()
            .map(|s| s.device)
            .chain(self.operations.values().map(OperationDescription::device))
            .chain(self.macros.iter().map(|(_, m)| m.trigger.device))
            .filter(|device| *device != DeviceRef::None)
            .collect();
        devices.sort_by_key(|d| *d as u8);
        devices.dedup();
        devices
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut described = Bitmask::<S>::empty();
        for shift in &self.shifts {
            let name = shift.shift.name();
            if shift.device == DeviceRef::None {
                return Err(ConfigError::UnboundShiftDevice(name));
            }
            if described.contains(shift.shift) {
                return Err(ConfigError::DuplicateShift(name));
            }
            check_axis_range(name, &shift.input)?;
            described.insert(shift.shift);
        }

        for (op, desc) in &self.operations {
            let name = op.name();
            if !desc.is_wired_consistently() {
                return Err(ConfigError::InconsistentInput(name));
            }
            if let OperationDescription::Digital(DigitalDescription {
                input: Some(input),
                ..
            }) = desc
            {
                check_axis_range(name, input)?;
            }
            if let OperationDescription::Analog(analog) = desc {
                if !(0.0..1.0).contains(&analog.deadzone) {
                    return Err(ConfigError::InvalidDeadzone(name));
                }
            }
            check_conditions(name, desc.conditions(), described)?;
        }

        let mut seen_macros = Bitmask::<O>::empty();
        for (index, (op, desc)) in self.macros.iter().enumerate() {
            let name = op.name();
            if seen_macros.contains(*op) || self.operations.contains_key(op) {
                return Err(ConfigError::DuplicateOperation(name));
            }
            seen_macros.insert(*op);

            let trigger = &desc.trigger;
            if (trigger.device == DeviceRef::None) != trigger.input.is_none() {
                return Err(ConfigError::InconsistentInput(name));
            }
            if let Some(input) = &trigger.input {
                check_axis_range(name, input)?;
            }
            check_conditions(name, &trigger.conditions, described)?;

            if desc.affected.is_empty() {
                return Err(ConfigError::EmptyMacro(name));
            }
            for affected in desc.affected.iter() {
                if !self.operations.contains_key(&affected) {
                    return Err(ConfigError::UnknownAffected {
                        macro_op: name,
                        operation: affected.name(),
                    });
                }
            }

            for step in &desc.script {
                for (target, value) in &step.values {
                    if !desc.affected.contains(*target) {
                        return Err(ConfigError::ScriptOutsideAffected {
                            macro_op: name,
                            operation: target.name(),
                        });
                    }
                    let kind = self.operations[target].kind();
                    if value.kind() != kind {
                        return Err(ConfigError::ScriptKindMismatch {
                            macro_op: name,
                            operation: target.name(),
                        });
                    }
                }
            }

            if !self.allow_overlapping_macros {
                for (other, other_desc) in &self.macros[..index] {
                    if other_desc.affected.intersects(&desc.affected) {
                        return Err(ConfigError::OverlappingMacros {
                            first: other.name(),
                            second: name,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

fn check_axis_range(name: &'static str, input: &DigitalInput) -> Result<(), ConfigError> {
    match input {
        DigitalInput::AxisRange { min, max, .. } if min > max => {
            Err(ConfigError::EmptyAxisRange(name))
        }
        _ => Ok(()),
    }
}

fn check_conditions<S: Key>(
    name: &'static str,
    conditions: &ShiftConditions<S>,
    described: Bitmask<S>,
) -> Result<(), ConfigError> {
    let both = conditions.required().intersection(&conditions.forbidden());
    if let Some(shift) = both.iter().next() {
        return Err(ConfigError::ConflictingCondition {
            operation: name,
            shift: shift.name(),
        });
    }
    if let Some(shift) = conditions.shifts().iter().find(|s| !described.contains(*s)) {
        return Err(ConfigError::UndescribedShift {
            operation: name,
            shift: shift.name(),
        });
    }
    Ok(())
}

/// Collects descriptions and validates them into [`Bindings`].
#[derive(Debug, Clone)]
pub struct BindingsBuilder<O: Key, S: Key> {
    shifts: Vec<ShiftDescription<S>>,
    operations: Vec<(O, OperationDescription<S>)>,
    macros: Vec<(O, MacroDescription<O, S>)>,
    allow_overlapping_macros: bool,
}

impl<O: Key, S: Key> Default for BindingsBuilder<O, S> {
    fn default() -> Self {
        Self {
            shifts: Vec::new(),
            operations: Vec::new(),
            macros: Vec::new(),
            allow_overlapping_macros: false,
        }
    }
}

impl<O: Key, S: Key> BindingsBuilder<O, S> {
    #[must_use]
    pub fn shift(mut self, description: ShiftDescription<S>) -> Self {
        self.shifts.push(description);
        self
    }

    #[must_use]
    pub fn operation(mut self, operation: O, description: OperationDescription<S>) -> Self {
        self.operations.push((operation, description));
        self
    }

    #[must_use]
    pub fn digital(self, operation: O, description: DigitalDescription<S>) -> Self {
        self.operation(operation, OperationDescription::Digital(description))
    }

    #[must_use]
    pub fn analog(self, operation: O, description: AnalogDescription<S>) -> Self {
        self.operation(operation, OperationDescription::Analog(description))
    }

    /// Adds a macro. Macros added earlier win conflicting activations.
    #[must_use]
    pub fn macro_operation(mut self, operation: O, description: MacroDescription<O, S>) -> Self {
        self.macros.push((operation, description));
        self
    }

    #[must_use]
    pub fn allow_overlapping_macros(mut self, allow: bool) -> Self {
        self.allow_overlapping_macros = allow;
        self
    }

    pub fn build(self) -> Result<Bindings<O, S>, ConfigError> {
        let mut operations = AHashMap::with_capacity(self.operations.len());
        for (op, desc) in self.operations {
            if operations.insert(op, desc).is_some() {
                return Err(ConfigError::DuplicateOperation(op.name()));
            }
        }

        let bindings = Bindings {
            shifts: self.shifts,
            operations,
            macros: self.macros,
            allow_overlapping_macros: self.allow_overlapping_macros,
        };
        bindings.validate()?;
        Ok(bindings)
    }
}
