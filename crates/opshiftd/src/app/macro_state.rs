use std::fmt;

use opshift_bindings::Value;
use opshift_bit_mask::{Bitmask, Key};

use super::task::{Task, TaskError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroPhase {
    NotStarted,
    Active,
    Ended,
}

/// What a call to [`MacroOperationState::run`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroStep {
    /// Not active, nothing happened.
    Idle,
    /// The task was updated and keeps running.
    Running,
    /// The task finished and was ended.
    Completed,
    /// The task asked to be cancelled and was stopped.
    Cancelled,
}

/// One run of a macro: drives its task from begin to end or stop.
///
/// An ended state never runs again; every activation gets a new one.
pub struct MacroOperationState<O: Key> {
    operation: O,
    affected: Bitmask<O>,
    phase: MacroPhase,
    task: Option<Box<dyn Task<O>>>,
}

impl<O: Key> fmt::Debug for MacroOperationState<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroOperationState")
            .field("operation", &self.operation)
            .field("affected", &self.affected)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<O: Key> MacroOperationState<O> {
    pub fn new(operation: O, affected: Bitmask<O>, task: Box<dyn Task<O>>) -> Self {
        Self {
            operation,
            affected,
            phase: MacroPhase::NotStarted,
            task: Some(task),
        }
    }

    pub fn operation(&self) -> O {
        self.operation
    }

    /// Operations owned while the macro is active. Fixed at construction.
    pub fn affected(&self) -> Bitmask<O> {
        self.affected
    }

    pub fn phase(&self) -> MacroPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == MacroPhase::Active
    }

    pub fn has_begun(&self) -> bool {
        self.phase != MacroPhase::NotStarted
    }

    pub fn has_ended(&self) -> bool {
        self.phase == MacroPhase::Ended
    }

    /// Begins the task. Returns false unless the state had not started yet.
    pub fn start(&mut self) -> bool {
        if self.phase != MacroPhase::NotStarted {
            return false;
        }
        let Some(task) = self.task.as_mut() else {
            return false;
        };
        task.begin();
        self.phase = MacroPhase::Active;
        true
    }

    /// Advances an active task by one cycle.
    ///
    /// A failing `update` stops the task and ends the macro before the error
    /// is returned.
    pub fn run(&mut self) -> Result<MacroStep, TaskError> {
        if self.phase != MacroPhase::Active {
            return Ok(MacroStep::Idle);
        }
        let Some(task) = self.task.as_mut() else {
            self.phase = MacroPhase::Ended;
            return Ok(MacroStep::Cancelled);
        };

        if task.has_completed() {
            task.end();
            self.finish();
            return Ok(MacroStep::Completed);
        }
        if task.should_cancel() {
            task.stop();
            self.finish();
            return Ok(MacroStep::Cancelled);
        }
        if let Err(e) = task.update() {
            task.stop();
            self.finish();
            return Err(e);
        }
        Ok(MacroStep::Running)
    }

    /// Ends the macro from outside. The task is stopped only if it had begun.
    pub fn cancel(&mut self) {
        if self.phase == MacroPhase::Active {
            if let Some(task) = self.task.as_mut() {
                task.stop();
            }
        }
        self.finish();
    }

    /// The value the task drives `operation` to while active.
    pub fn value(&self, operation: O) -> Option<Value> {
        if !self.is_active() {
            return None;
        }
        self.task.as_ref()?.value(operation)
    }

    fn finish(&mut self) {
        self.phase = MacroPhase::Ended;
        self.task = None;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use opshift_bit_derive::Key;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
    enum Op {
        Lift,
        Climb,
    }

    /// Every lifecycle call a [`ProbeTask`] received.
    #[derive(Debug, Default)]
    pub(crate) struct Calls {
        pub begin: u32,
        pub update: u32,
        pub end: u32,
        pub stop: u32,
    }

    /// A task steered by the test through shared flags.
    #[derive(Default)]
    pub(crate) struct Probe {
        pub calls: Calls,
        pub completed: bool,
        pub cancel: bool,
        pub fail: bool,
        pub value: Option<Value>,
    }

    pub(crate) struct ProbeTask(pub Rc<RefCell<Probe>>);

    impl<O: Key> Task<O> for ProbeTask {
        fn begin(&mut self) {
            self.0.borrow_mut().calls.begin += 1;
        }

        fn update(&mut self) -> Result<(), TaskError> {
            let mut probe = self.0.borrow_mut();
            probe.calls.update += 1;
            if probe.fail {
                return Err("probe failure".into());
            }
            Ok(())
        }

        fn end(&mut self) {
            self.0.borrow_mut().calls.end += 1;
        }

        fn stop(&mut self) {
            self.0.borrow_mut().calls.stop += 1;
        }

        fn has_completed(&self) -> bool {
            self.0.borrow().completed
        }

        fn should_cancel(&self) -> bool {
            self.0.borrow().cancel
        }

        fn value(&self, _operation: O) -> Option<Value> {
            self.0.borrow().value
        }
    }

    fn climb() -> (Rc<RefCell<Probe>>, MacroOperationState<Op>) {
        let probe = Rc::new(RefCell::new(Probe::default()));
        let state = MacroOperationState::new(
            Op::Climb,
            Bitmask::new(&[Op::Lift]),
            Box::new(ProbeTask(Rc::clone(&probe))),
        );
        (probe, state)
    }

    #[test]
    fn runs_through_begin_update_end() {
        let (probe, mut state) = climb();
        assert_eq!(state.phase(), MacroPhase::NotStarted);
        assert_eq!(state.run().expect("run"), MacroStep::Idle);
        assert_eq!(probe.borrow().calls.begin, 0);

        assert!(state.start());
        assert!(state.is_active());
        assert!(!state.start());
        assert_eq!(state.run().expect("run"), MacroStep::Running);
        assert_eq!(state.run().expect("run"), MacroStep::Running);

        probe.borrow_mut().completed = true;
        assert_eq!(state.run().expect("run"), MacroStep::Completed);
        assert_eq!(state.run().expect("run"), MacroStep::Idle);

        let probe = probe.borrow();
        assert_eq!(probe.calls.begin, 1);
        assert_eq!(probe.calls.update, 2);
        assert_eq!(probe.calls.end, 1);
        assert_eq!(probe.calls.stop, 0);
        assert!(!state.is_active());
        assert!(state.has_ended());
    }

    #[test]
    fn should_cancel_stops_the_task() {
        let (probe, mut state) = climb();
        state.start();
        probe.borrow_mut().cancel = true;
        assert_eq!(state.run().expect("run"), MacroStep::Cancelled);
        assert_eq!(probe.borrow().calls.stop, 1);
        assert_eq!(probe.borrow().calls.update, 0);
        assert!(!state.start());
    }

    #[test]
    fn failing_update_stops_and_ends() {
        let (probe, mut state) = climb();
        state.start();
        probe.borrow_mut().fail = true;
        assert!(state.run().is_err());
        assert!(state.has_ended());
        assert_eq!(probe.borrow().calls.stop, 1);
        assert_eq!(state.run().expect("run"), MacroStep::Idle);
        assert_eq!(probe.borrow().calls.update, 1);
    }

    #[test]
    fn cancel_stops_an_active_task_once() {
        let (probe, mut state) = climb();
        state.start();
        state.cancel();
        state.cancel();
        assert!(state.has_ended());
        assert_eq!(probe.borrow().calls.stop, 1);
        assert_eq!(probe.borrow().calls.end, 0);
    }

    #[test]
    fn cancel_before_start_never_stops() {
        let (probe, mut state) = climb();
        state.cancel();
        assert!(state.has_ended());
        assert!(!state.start());
        assert_eq!(probe.borrow().calls.begin, 0);
        assert_eq!(probe.borrow().calls.stop, 0);
    }

    #[test]
    fn value_is_reported_only_while_active() {
        let (probe, mut state) = climb();
        probe.borrow_mut().value = Some(Value::Analog(0.4));
        assert_eq!(state.value(Op::Lift), None);
        state.start();
        assert_eq!(state.value(Op::Lift), Some(Value::Analog(0.4)));
        state.cancel();
        assert_eq!(state.value(Op::Lift), None);
    }
}
