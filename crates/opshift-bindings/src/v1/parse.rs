use opshift_bit_mask::{Bitmask, Key};
use opshift_device::DeviceRef;

use crate::bindings::BindingsBuilder;
use crate::description::{
    AnalogDescription, ButtonMode, DigitalDescription, DigitalInput,
    MacroDescription, OperationDescription, ScriptStep, ShiftConditions,
    ShiftDescription, Value,
};

use super::profile::{
    BindingsV1, BindingsV1AxisRange, BindingsV1Macro, BindingsV1Operation,
    BindingsV1Shift, BindingsV1Step,
};
use super::shift_expr::parse_shift_expr;
use super::Error;

impl BindingsV1 {
    pub(crate) fn parse<O: Key, S: Key>(self) -> Result<BindingsBuilder<O, S>, Error> {
        let mut builder = BindingsBuilder::default()
            .allow_overlapping_macros(self.allow_overlapping_macros);

        for (name, raw) in &self.shifts {
            builder = builder.shift(parse_shift::<S>(name, raw)?);
        }

        for (name, raw) in &self.operations {
            let operation = parse_operation_name::<O>(name)?;
            builder = builder.operation(operation, parse_operation::<S>(name, raw)?);
        }

        for raw in &self.macros {
            let operation = parse_operation_name::<O>(&raw.operation)?;
            builder = builder.macro_operation(operation, parse_macro(raw)?);
        }

        Ok(builder)
    }
}

fn parse_operation_name<O: Key>(name: &str) -> Result<O, Error> {
    O::from_name(name).ok_or_else(|| Error::UnknownOperation(name.to_string()))
}

fn parse_device(name: &str) -> Result<DeviceRef, Error> {
    DeviceRef::from_name(name).ok_or_else(|| Error::UnknownDevice(name.to_string()))
}

fn parse_optional_device(name: Option<&str>) -> Result<DeviceRef, Error> {
    name.map(parse_device).transpose().map(Option::unwrap_or_default)
}

fn parse_mode(target: &str, raw: Option<&str>) -> Result<ButtonMode, Error> {
    Ok(match raw.map(str::to_lowercase).as_deref() {
        None | Some("simple") => ButtonMode::Simple,
        Some("click") => ButtonMode::Click,
        Some("toggle") => ButtonMode::Toggle,
        Some(other) => return Err(Error::InvalidMode(target.to_string(), other.to_string())),
    })
}

/// Picks the single digital input out of the mutually exclusive fields.
fn parse_digital_input(
    target: &str,
    button: Option<u8>,
    pov: Option<i32>,
    axis_range: Option<BindingsV1AxisRange>,
) -> Result<Option<DigitalInput>, Error> {
    match (button, pov, axis_range) {
        (None, None, None) => Ok(None),
        (Some(button), None, None) => Ok(Some(DigitalInput::Button(button))),
        (None, Some(angle), None) => Ok(Some(DigitalInput::Pov(angle))),
        (None, None, Some(range)) => Ok(Some(DigitalInput::AxisRange {
            axis: range.axis,
            min: range.min,
            max: range.max,
        })),
        _ => Err(Error::AmbiguousInput(target.to_string())),
    }
}

fn parse_conditions<S: Key>(target: &str, raw: Option<&str>) -> Result<ShiftConditions<S>, Error> {
    let Some(raw) = raw else {
        return Ok(ShiftConditions::none());
    };
    let terms = parse_shift_expr(raw)
        .map_err(|e| Error::InvalidCondition(target.to_string(), format!("{raw}: {:?}", e.kind)))?;

    let mut conditions = ShiftConditions::none();
    for term in terms {
        let shift = S::from_name(term.name)
            .ok_or_else(|| Error::UnknownShift(term.name.to_string()))?;
        conditions = if term.negated {
            conditions.forbid(shift)
        } else {
            conditions.require(shift)
        };
    }
    Ok(conditions)
}

fn parse_shift<S: Key>(name: &str, raw: &BindingsV1Shift) -> Result<ShiftDescription<S>, Error> {
    let shift = S::from_name(name).ok_or_else(|| Error::UnknownShift(name.to_string()))?;
    let device = parse_device(&raw.device)?;
    let input = parse_digital_input(name, raw.button, raw.pov, raw.axis_range)?
        .ok_or_else(|| Error::MissingInput(name.to_string()))?;
    Ok(ShiftDescription { shift, device, input })
}

fn parse_operation<S: Key>(
    name: &str,
    raw: &BindingsV1Operation,
) -> Result<OperationDescription<S>, Error> {
    let device = parse_optional_device(raw.device.as_deref())?;
    let conditions = parse_conditions::<S>(name, raw.shifts.as_deref())?;
    let digital_input = parse_digital_input(name, raw.button, raw.pov, raw.axis_range)?;
    let has_analog_options =
        raw.invert.is_some() || raw.multiplier.is_some() || raw.deadzone.is_some();

    let analog = match (raw.axis, digital_input) {
        (Some(_), Some(_)) => return Err(Error::AmbiguousInput(name.to_string())),
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => match raw.kind.as_deref().map(str::to_lowercase).as_deref() {
            Some("analog") => true,
            None | Some("digital") => false,
            Some(other) => return Err(Error::InvalidKind(name.to_string(), other.to_string())),
        },
    };

    if analog {
        if let Some(mode) = &raw.mode {
            return Err(Error::InvalidMode(name.to_string(), mode.clone()));
        }
        Ok(OperationDescription::Analog(AnalogDescription {
            device,
            axis: raw.axis,
            invert: raw.invert.unwrap_or(false),
            multiplier: raw.multiplier.unwrap_or(1.0),
            deadzone: raw.deadzone.unwrap_or(0.0),
            conditions,
        }))
    } else {
        if has_analog_options {
            return Err(Error::AnalogOptionsOnDigital(name.to_string()));
        }
        Ok(OperationDescription::Digital(DigitalDescription {
            device,
            input: digital_input,
            mode: parse_mode(name, raw.mode.as_deref())?,
            conditions,
        }))
    }
}

fn parse_macro<O: Key, S: Key>(raw: &BindingsV1Macro) -> Result<MacroDescription<O, S>, Error> {
    let name = raw.operation.as_str();
    let trigger = DigitalDescription {
        device: parse_optional_device(raw.device.as_deref())?,
        input: parse_digital_input(name, raw.button, raw.pov, raw.axis_range)?,
        mode: parse_mode(name, raw.mode.as_deref())?,
        conditions: parse_conditions::<S>(name, raw.shifts.as_deref())?,
    };

    let affected = raw
        .affects
        .iter()
        .map(|op| parse_operation_name::<O>(op))
        .collect::<Result<Bitmask<O>, _>>()?;

    let script = raw
        .script
        .iter()
        .map(|step| parse_step(name, step))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MacroDescription {
        trigger,
        affected,
        script,
    })
}

fn parse_step<O: Key>(macro_name: &str, raw: &BindingsV1Step) -> Result<ScriptStep<O>, Error> {
    let mut step = ScriptStep::new(raw.cycles);
    for (target, value) in &raw.set {
        let operation = parse_operation_name::<O>(target)?;
        let value = match value {
            serde_yaml::Value::Bool(b) => Value::Digital(*b),
            serde_yaml::Value::Number(n) => n
                .as_f64()
                .map(Value::Analog)
                .ok_or_else(|| Error::InvalidScriptValue(macro_name.to_string(), target.clone()))?,
            _ => {
                return Err(Error::InvalidScriptValue(
                    macro_name.to_string(),
                    target.clone(),
                ))
            }
        };
        step = step.set(operation, value);
    }
    Ok(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_bindings, ConfigError, ProfileError};
    use opshift_bit_derive::Key;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
    enum Op {
        DriveForward,
        IntakeIn,
        IntakeOut,
        ShooterAim,
        ElevatorUp,
        ElevatorPower,
        Climb,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
    enum Shift {
        CoDriverAlt,
        DriverDebug,
    }

    const BINDINGS: &str = r#"
version: 1
shifts:
  co_driver_alt: { device: co_driver, button: 5 }
  driver_debug: { device: driver, pov: 180 }
operations:
  drive_forward: { device: driver, axis: 1, invert: true, deadzone: 0.1 }
  intake_in: { device: co_driver, button: 1, shifts: "!co_driver_alt" }
  intake_out: { device: co_driver, button: 1, shifts: "co_driver_alt" }
  shooter_aim:
    device: co_driver
    axis_range: { axis: 3, min: 0.5, max: 1.0 }
    mode: toggle
  elevator_up: { kind: digital }
  elevator_power: { kind: analog }
macros:
  - operation: climb
    device: co_driver
    button: 8
    mode: click
    shifts: "!driver_debug"
    affects: [elevator_up, elevator_power]
    script:
      - cycles: 10
        set: { elevator_up: true, elevator_power: 0.75 }
      - cycles: 5
        set: { elevator_power: 0.2 }
"#;

    #[test]
    fn parses_full_bindings() {
        let bindings =
            parse_bindings::<Op, Shift>(BINDINGS).expect("bindings should parse");

        assert_eq!(bindings.shifts().len(), 2);

        let Some(OperationDescription::Analog(drive)) = bindings.operation(Op::DriveForward)
        else {
            panic!("drive_forward should be analog");
        };
        assert_eq!(drive.device, DeviceRef::Driver);
        assert_eq!(drive.axis, Some(1));
        assert!(drive.invert);
        assert_eq!(drive.deadzone, 0.1);
        assert_eq!(drive.multiplier, 1.0);

        let Some(OperationDescription::Digital(intake_out)) = bindings.operation(Op::IntakeOut)
        else {
            panic!("intake_out should be digital");
        };
        assert_eq!(
            intake_out.conditions,
            ShiftConditions::none().require(Shift::CoDriverAlt)
        );

        let Some(OperationDescription::Digital(aim)) = bindings.operation(Op::ShooterAim) else {
            panic!("shooter_aim should be digital");
        };
        assert_eq!(aim.mode, ButtonMode::Toggle);
        assert_eq!(
            aim.input,
            Some(DigitalInput::AxisRange {
                axis: 3,
                min: 0.5,
                max: 1.0
            })
        );

        let Some(OperationDescription::Analog(power)) = bindings.operation(Op::ElevatorPower)
        else {
            panic!("elevator_power should be analog");
        };
        assert_eq!(power.device, DeviceRef::None);
        assert_eq!(power.axis, None);

        let climb = bindings.macro_description(Op::Climb).expect("climb macro");
        assert_eq!(climb.trigger.mode, ButtonMode::Click);
        assert_eq!(climb.trigger.input, Some(DigitalInput::Button(8)));
        assert_eq!(climb.affected, Bitmask::new(&[Op::ElevatorUp, Op::ElevatorPower]));
        assert_eq!(climb.script.len(), 2);
        assert_eq!(climb.script[0].value(Op::ElevatorPower), Some(Value::Analog(0.75)));
        assert_eq!(climb.script[0].value(Op::ElevatorUp), Some(Value::Digital(true)));
        assert_eq!(climb.script[1].value(Op::ElevatorUp), None);
    }

    #[test]
    fn rejects_unknown_names() {
        let yaml = "version: 1\noperations:\n  warp_drive: { device: driver, button: 1 }\n";
        assert!(matches!(
            parse_bindings::<Op, Shift>(yaml),
            Err(ProfileError::V1ProfileError(Error::UnknownOperation(name))) if name == "warp_drive"
        ));

        let yaml = "version: 1\noperations:\n  intake_in: { device: joystick, button: 1 }\n";
        assert!(matches!(
            parse_bindings::<Op, Shift>(yaml),
            Err(ProfileError::V1ProfileError(Error::UnknownDevice(_)))
        ));

        let yaml = "version: 1\noperations:\n  intake_in: { device: driver, button: 1, shifts: turbo }\n";
        assert!(matches!(
            parse_bindings::<Op, Shift>(yaml),
            Err(ProfileError::V1ProfileError(Error::UnknownShift(_)))
        ));
    }

    #[test]
    fn rejects_ambiguous_and_misplaced_inputs() {
        let yaml = "version: 1\noperations:\n  intake_in: { device: driver, button: 1, pov: 90 }\n";
        assert!(matches!(
            parse_bindings::<Op, Shift>(yaml),
            Err(ProfileError::V1ProfileError(Error::AmbiguousInput(_)))
        ));

        let yaml = "version: 1\noperations:\n  intake_in: { device: driver, button: 1, deadzone: 0.2 }\n";
        assert!(matches!(
            parse_bindings::<Op, Shift>(yaml),
            Err(ProfileError::V1ProfileError(Error::AnalogOptionsOnDigital(_)))
        ));

        let yaml = "version: 1\noperations:\n  intake_in: { device: driver }\n";
        assert!(matches!(
            parse_bindings::<Op, Shift>(yaml),
            Err(ProfileError::Config(ConfigError::InconsistentInput("intake_in")))
        ));
    }

    #[test]
    fn rejects_malformed_condition_expressions() {
        let yaml = r#"
version: 1
shifts:
  co_driver_alt: { device: co_driver, button: 5 }
operations:
  intake_in: { device: co_driver, button: 1, shifts: "co_driver_alt +" }
"#;
        assert!(matches!(
            parse_bindings::<Op, Shift>(yaml),
            Err(ProfileError::V1ProfileError(Error::InvalidCondition(_, _)))
        ));
    }

    #[test]
    fn rejects_non_scalar_script_values() {
        let yaml = r#"
version: 1
operations:
  elevator_up: { kind: digital }
macros:
  - operation: climb
    affects: [elevator_up]
    script:
      - cycles: 1
        set: { elevator_up: "yes" }
"#;
        assert!(matches!(
            parse_bindings::<Op, Shift>(yaml),
            Err(ProfileError::V1ProfileError(Error::InvalidScriptValue(_, _)))
        ));
    }
}
