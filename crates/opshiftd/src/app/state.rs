use opshift_bindings::{OperationDescription, Value};
use opshift_bit_mask::{Bitmask, Key};
use opshift_device::DeviceSet;

use super::evaluator::ButtonEvaluator;
use super::input::{read_axis, read_digital};

/// Who currently decides the value of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership<O> {
    /// Resolved from the operation's own binding.
    Input,
    /// Checked out by the running macro `O`.
    Macro(O),
}

/// Runtime state of one bound operation.
#[derive(Debug, Clone)]
pub struct OperationState<O: Key, S: Key> {
    description: OperationDescription<S>,
    evaluator: ButtonEvaluator,
    value: Value,
    owner: Ownership<O>,
}

impl<O: Key, S: Key> OperationState<O, S> {
    pub fn new(description: OperationDescription<S>) -> Self {
        let evaluator = match &description {
            OperationDescription::Digital(digital) => ButtonEvaluator::from(digital.mode),
            OperationDescription::Analog(_) => ButtonEvaluator::Simple,
        };
        Self {
            value: Value::neutral(description.kind()),
            description,
            evaluator,
            owner: Ownership::Input,
        }
    }

    pub fn description(&self) -> &OperationDescription<S> {
        &self.description
    }

    /// The value resolved from input in the last cycle.
    pub fn value(&self) -> Value {
        self.value
    }

    pub fn owner(&self) -> Ownership<O> {
        self.owner
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self.owner, Ownership::Macro(_))
    }

    /// Hands the operation to `macro_op` until [`give_back`](Self::give_back).
    pub fn check_out(&mut self, macro_op: O) {
        self.owner = Ownership::Macro(macro_op);
        self.value = Value::neutral(self.description.kind());
    }

    pub fn give_back(&mut self) {
        self.owner = Ownership::Input;
    }

    /// Resolves the value for this cycle.
    ///
    /// Ineligible or checked out operations read neutral without touching the
    /// evaluator, so a press made while a binding is shifted away is not
    /// consumed as an edge later.
    pub fn check_input(&mut self, active_shifts: &Bitmask<S>, devices: &DeviceSet) {
        if self.is_interrupted() || !self.description.conditions().is_eligible(active_shifts) {
            self.value = Value::neutral(self.description.kind());
            return;
        }

        self.value = match &self.description {
            OperationDescription::Digital(digital) => {
                let Some(input) = &digital.input else {
                    self.value = Value::Digital(false);
                    return;
                };
                let raw = read_digital(devices, digital.device, input);
                Value::Digital(self.evaluator.evaluate(raw))
            }
            OperationDescription::Analog(analog) => {
                let Some(axis) = analog.axis else {
                    self.value = Value::Analog(0.0);
                    return;
                };
                Value::Analog(analog.shape(read_axis(devices, analog.device, axis)))
            }
        };
    }

    /// Drops evaluator memory and the resolved value.
    pub fn reset(&mut self) {
        self.evaluator.reset();
        self.value = Value::neutral(self.description.kind());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opshift_bindings::{
        AnalogDescription, ButtonMode, DigitalDescription, ShiftConditions,
    };
    use opshift_bit_derive::Key;
    use opshift_device::{DeviceRef, VirtualDevice};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
    enum Op {
        Intake,
        Climb,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
    enum Shift {
        Alt,
    }

    fn pad() -> (VirtualDevice, DeviceSet) {
        let pad = VirtualDevice::new();
        let devices = DeviceSet::new()
            .with(DeviceRef::Driver, pad.clone())
            .expect("driver slot");
        (pad, devices)
    }

    fn toggle_under_alt() -> OperationState<Op, Shift> {
        OperationState::new(OperationDescription::Digital(
            DigitalDescription::button(DeviceRef::Driver, 1, ButtonMode::Toggle)
                .with_conditions(ShiftConditions::none().require(Shift::Alt)),
        ))
    }

    #[test]
    fn ineligible_binding_reads_neutral_and_keeps_evaluator() {
        let (pad, devices) = pad();
        let mut state = toggle_under_alt();
        let alt = Bitmask::new(&[Shift::Alt]);

        // Press while the shift is released: must not flip the toggle.
        pad.set_button(1, true);
        state.check_input(&Bitmask::empty(), &devices);
        assert_eq!(state.value(), Value::Digital(false));

        // Still held when the shift engages: no new edge is seen.
        pad.set_button(1, false);
        state.check_input(&alt, &devices);
        assert_eq!(state.value(), Value::Digital(false));

        pad.set_button(1, true);
        state.check_input(&alt, &devices);
        assert_eq!(state.value(), Value::Digital(true));
    }

    #[test]
    fn ineligible_cycles_do_not_record_previous_input() {
        let (pad, devices) = pad();
        let mut state = toggle_under_alt();
        let alt = Bitmask::new(&[Shift::Alt]);

        pad.set_button(1, true);
        state.check_input(&alt, &devices);
        assert_eq!(state.value(), Value::Digital(true));

        // Release and press again while shifted away; the evaluator still
        // remembers the button as held.
        pad.set_button(1, false);
        state.check_input(&Bitmask::empty(), &devices);
        pad.set_button(1, true);
        state.check_input(&Bitmask::empty(), &devices);
        state.check_input(&alt, &devices);
        assert_eq!(state.value(), Value::Digital(true));
    }

    #[test]
    fn checked_out_operation_reads_neutral() {
        let (pad, devices) = pad();
        let mut state = OperationState::<Op, Shift>::new(OperationDescription::Digital(
            DigitalDescription::button(DeviceRef::Driver, 1, ButtonMode::Simple),
        ));
        pad.set_button(1, true);

        state.check_input(&Bitmask::empty(), &devices);
        assert_eq!(state.value(), Value::Digital(true));

        state.check_out(Op::Climb);
        assert!(state.is_interrupted());
        assert_eq!(state.owner(), Ownership::Macro(Op::Climb));
        state.check_input(&Bitmask::empty(), &devices);
        assert_eq!(state.value(), Value::Digital(false));

        state.give_back();
        state.check_input(&Bitmask::empty(), &devices);
        assert_eq!(state.value(), Value::Digital(true));
    }

    #[test]
    fn analog_reads_shaped_axis() {
        let (pad, devices) = pad();
        let mut state = OperationState::<Op, Shift>::new(OperationDescription::Analog(
            AnalogDescription::axis(DeviceRef::Driver, 1).inverted(),
        ));
        pad.set_axis(1, 0.5);
        state.check_input(&Bitmask::empty(), &devices);
        assert_eq!(state.value(), Value::Analog(-0.5));
    }

    #[test]
    fn unbound_operation_stays_neutral() {
        let (_pad, devices) = pad();
        let mut state =
            OperationState::<Op, Shift>::new(OperationDescription::Analog(AnalogDescription::unbound()));
        state.check_input(&Bitmask::empty(), &devices);
        assert_eq!(state.value(), Value::Analog(0.0));
    }
}
