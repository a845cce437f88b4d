use ahash::AHashMap;

use opshift_bindings::{Bindings, ButtonMode, DigitalDescription, MacroDescription, Value};
use opshift_bit_mask::{Bitmask, Key};
use opshift_device::DeviceSet;

use crate::{print_debug, print_error, print_info, print_warning};

use super::error::DriverError;
use super::evaluator::ButtonEvaluator;
use super::input::read_digital;
use super::macro_state::{MacroOperationState, MacroStep};
use super::shift::resolve_active_shifts;
use super::state::{OperationState, Ownership};
use super::task::TaskFactory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerRequest {
    Start,
    Cancel,
}

/// Trigger binding and current run of one macro operation.
#[derive(Debug)]
struct MacroSlot<O: Key, S: Key> {
    operation: O,
    trigger: DigitalDescription<S>,
    evaluator: ButtonEvaluator,
    affected: Bitmask<O>,
    /// Trigger output of the previous cycle.
    latched: bool,
    run: Option<MacroOperationState<O>>,
}

impl<O: Key, S: Key> MacroSlot<O, S> {
    fn new(operation: O, description: &MacroDescription<O, S>) -> Self {
        Self {
            operation,
            trigger: description.trigger,
            evaluator: ButtonEvaluator::from(description.trigger.mode),
            affected: description.affected,
            latched: false,
            run: None,
        }
    }

    fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(MacroOperationState::is_active)
    }

    /// An ineligible or unwired trigger reads released and leaves the
    /// evaluator alone.
    fn read_trigger(&mut self, active_shifts: &Bitmask<S>, devices: &DeviceSet) -> bool {
        if !self.trigger.conditions.is_eligible(active_shifts) {
            return false;
        }
        let Some(input) = &self.trigger.input else {
            return false;
        };
        let raw = read_digital(devices, self.trigger.device, input);
        self.evaluator.evaluate(raw)
    }

    /// Puts a toggle trigger in step with a run started without it.
    fn latch(&mut self) {
        if self.trigger.mode == ButtonMode::Toggle {
            self.evaluator.engage_latch();
            self.latched = true;
        }
    }

    /// Puts a toggle trigger in step with a macro that is not running.
    fn unlatch(&mut self) {
        if self.trigger.mode == ButtonMode::Toggle {
            self.evaluator.release_latch();
            self.latched = false;
        }
    }

    fn request(&mut self, pressed: bool) -> Option<TriggerRequest> {
        let request = match self.trigger.mode {
            ButtonMode::Click => match (pressed, self.is_running()) {
                (false, _) => None,
                (true, false) => Some(TriggerRequest::Start),
                (true, true) => Some(TriggerRequest::Cancel),
            },
            ButtonMode::Simple | ButtonMode::Toggle => match (self.latched, pressed) {
                (false, true) => Some(TriggerRequest::Start),
                (true, false) if self.is_running() => Some(TriggerRequest::Cancel),
                _ => None,
            },
        };
        self.latched = pressed;
        request
    }
}

/// Resolves every operation once per cycle.
///
/// Owns the bindings, the devices and the runtime state built from them. Each
/// [`update`](Self::update) resolves shifts, runs active macros, evaluates
/// operations that are not checked out and finally handles macro triggers.
/// Mechanisms read the results between cycles.
pub struct Driver<O: Key, S: Key> {
    bindings: Bindings<O, S>,
    devices: DeviceSet,
    tasks: Box<dyn TaskFactory<O>>,
    states: AHashMap<O, OperationState<O, S>>,
    /// In priority order.
    macros: Vec<MacroSlot<O, S>>,
    active_shifts: Bitmask<S>,
    checked_out: Bitmask<O>,
    activations: u64,
}

impl<O: Key, S: Key> Driver<O, S> {
    /// Wires the bindings to `devices`.
    ///
    /// Fails if a binding reads from a device that is not in the set.
    pub fn new(
        bindings: Bindings<O, S>,
        devices: DeviceSet,
        tasks: impl TaskFactory<O> + 'static,
    ) -> Result<Self, DriverError> {
        for device in bindings.devices() {
            devices.require(device)?;
        }

        let states = bindings
            .operations()
            .map(|(op, description)| (op, OperationState::new(*description)))
            .collect::<AHashMap<_, _>>();
        let macros = bindings
            .macros()
            .iter()
            .map(|(op, description)| MacroSlot::new(*op, description))
            .collect::<Vec<_>>();

        print_info!(
            "driver ready - {} operations, {} macros, {} shifts",
            states.len(),
            macros.len(),
            bindings.shifts().len()
        );

        Ok(Self {
            bindings,
            devices,
            tasks: Box::new(tasks),
            states,
            macros,
            active_shifts: Bitmask::empty(),
            checked_out: Bitmask::empty(),
            activations: 0,
        })
    }

    pub fn bindings(&self) -> &Bindings<O, S> {
        &self.bindings
    }

    /// Runs one cycle.
    ///
    /// A failing task is stopped and its operations returned before the rest
    /// of the cycle runs; the first such failure is reported once the cycle is
    /// complete.
    pub fn update(&mut self) -> Result<(), DriverError> {
        self.active_shifts = resolve_active_shifts(self.bindings.shifts(), &self.devices);

        let failure = self.run_macros();

        for state in self.states.values_mut() {
            state.check_input(&self.active_shifts, &self.devices);
        }

        self.check_triggers();

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn run_macros(&mut self) -> Option<DriverError> {
        let mut failure = None;
        for index in 0..self.macros.len() {
            let slot = &mut self.macros[index];
            let Some(state) = slot.run.as_mut() else {
                continue;
            };
            let name = slot.operation.name();
            match state.run() {
                Ok(MacroStep::Idle | MacroStep::Running) => continue,
                Ok(MacroStep::Completed) => {
                    print_info!("macro completed - {name}");
                }
                Ok(MacroStep::Cancelled) => {
                    print_info!("macro cancelled by its task - {name}");
                }
                Err(source) => {
                    print_error!("macro task failed - {name}: {source}");
                    if failure.is_none() {
                        failure = Some(DriverError::Task {
                            operation: name,
                            source,
                        });
                    }
                }
            }
            self.release(index);
        }
        failure
    }

    fn check_triggers(&mut self) {
        for index in 0..self.macros.len() {
            let slot = &mut self.macros[index];
            let pressed = slot.read_trigger(&self.active_shifts, &self.devices);
            match slot.request(pressed) {
                Some(TriggerRequest::Start) => {
                    if !self.activate(index) {
                        self.macros[index].unlatch();
                    }
                }
                Some(TriggerRequest::Cancel) => {
                    if self.cancel_slot(index) {
                        print_info!("macro cancelled - {}", self.macros[index].operation.name());
                    }
                }
                None => {}
            }
        }
    }

    /// Starts the macro at `index` unless it runs already or one of its
    /// operations is checked out.
    fn activate(&mut self, index: usize) -> bool {
        let slot = &self.macros[index];
        if slot.is_running() {
            return false;
        }
        let operation = slot.operation;
        let affected = slot.affected;
        let name = operation.name();

        let conflict = affected.intersection(&self.checked_out);
        if !conflict.is_empty() {
            print_debug!("macro activation dropped - {name} conflicts on {conflict:?}");
            return false;
        }

        let Some(task) = self.tasks.create(operation) else {
            print_warning!("macro activation dropped - no task for {name}");
            return false;
        };
        let mut state = MacroOperationState::new(operation, affected, task);
        state.start();

        for op in affected {
            if let Some(op_state) = self.states.get_mut(&op) {
                op_state.check_out(operation);
            }
        }
        self.checked_out = self.checked_out.union(&affected);
        self.macros[index].run = Some(state);
        self.activations += 1;

        print_info!("macro started - {name}");
        true
    }

    /// Cancels the run of the macro at `index`. Returns false if it was idle.
    fn cancel_slot(&mut self, index: usize) -> bool {
        let Some(state) = self.macros[index].run.as_mut() else {
            return false;
        };
        let was_active = state.is_active();
        state.cancel();
        self.release(index);
        was_active
    }

    /// Drops the run of the macro at `index` and gives its operations back.
    fn release(&mut self, index: usize) {
        let slot = &mut self.macros[index];
        let Some(state) = slot.run.take() else {
            return;
        };
        slot.unlatch();

        let owner = Ownership::Macro(slot.operation);
        for op in state.affected() {
            if let Some(op_state) = self.states.get_mut(&op) {
                if op_state.owner() == owner {
                    op_state.give_back();
                }
            }
            self.checked_out.remove(op);
        }
    }

    fn slot_index(&self, operation: O) -> Option<usize> {
        self.macros.iter().position(|slot| slot.operation == operation)
    }

    /// Starts a macro without its trigger, under the same conflict rules.
    ///
    /// Returns whether the macro started.
    pub fn start_macro(&mut self, operation: O) -> bool {
        let Some(index) = self.slot_index(operation) else {
            return false;
        };
        let started = self.activate(index);
        if started {
            self.macros[index].latch();
        }
        started
    }

    /// Cancels a running macro and gives its operations back immediately.
    ///
    /// Must not be called from inside a task. Returns whether a macro was
    /// running.
    pub fn cancel_macro(&mut self, operation: O) -> bool {
        let Some(index) = self.slot_index(operation) else {
            return false;
        };
        let cancelled = self.cancel_slot(index);
        if cancelled {
            print_info!("macro cancelled - {}", operation.name());
        }
        cancelled
    }

    /// Cancels every macro and forgets all input history.
    pub fn stop(&mut self) {
        for index in 0..self.macros.len() {
            self.cancel_slot(index);
            let slot = &mut self.macros[index];
            slot.evaluator.reset();
            slot.latched = false;
        }
        for state in self.states.values_mut() {
            state.reset();
        }
        self.active_shifts = Bitmask::empty();
        print_debug!("driver stopped");
    }

    /// Shifts resolved in the last cycle.
    pub fn active_shifts(&self) -> Bitmask<S> {
        self.active_shifts
    }

    pub fn is_macro_active(&self, operation: O) -> bool {
        self.slot_index(operation)
            .is_some_and(|index| self.macros[index].is_running())
    }

    /// Running macros in priority order.
    pub fn active_macros(&self) -> impl Iterator<Item = O> + '_ {
        self.macros
            .iter()
            .filter(|slot| slot.is_running())
            .map(|slot| slot.operation)
    }

    /// Number of macro runs started since construction.
    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Operations currently checked out by macros.
    pub fn checked_out(&self) -> Bitmask<O> {
        self.checked_out
    }

    pub fn owner(&self, operation: O) -> Option<Ownership<O>> {
        self.states.get(&operation).map(OperationState::owner)
    }

    pub fn is_interrupted(&self, operation: O) -> bool {
        self.states
            .get(&operation)
            .is_some_and(OperationState::is_interrupted)
    }

    /// The resolved value of `operation`, or `None` if it is not bound.
    ///
    /// Checked out operations read the value of the owning macro's task, or
    /// neutral if the task provides none. A macro operation reads true while
    /// its macro runs.
    pub fn value(&self, operation: O) -> Option<Value> {
        if let Some(index) = self.slot_index(operation) {
            return Some(Value::Digital(self.macros[index].is_running()));
        }

        let state = self.states.get(&operation)?;
        let value = match state.owner() {
            Ownership::Input => state.value(),
            Ownership::Macro(owner) => {
                let kind = state.description().kind();
                self.slot_index(owner)
                    .and_then(|index| self.macros[index].run.as_ref())
                    .and_then(|run| run.value(operation))
                    .filter(|value| value.kind() == kind)
                    .unwrap_or(Value::neutral(kind))
            }
        };
        Some(value)
    }

    /// Digital value of `operation`; false when unbound or analog.
    pub fn digital(&self, operation: O) -> bool {
        self.value(operation)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    /// Analog value of `operation`; 0.0 when unbound or digital.
    pub fn analog(&self, operation: O) -> f64 {
        self.value(operation)
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
    }
}
