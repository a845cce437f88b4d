use std::rc::Rc;

use ahash::AHashMap;
use opshift_bindings::{Bindings, ScriptStep, Value};
use opshift_bit_mask::Key;

pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// A routine driven by a macro, one step per cycle.
///
/// `begin` is called once before the first `update`, and exactly one of `end`
/// or `stop` terminates the task. `update` must return promptly: it runs
/// inside the control period.
pub trait Task<O: Key> {
    fn begin(&mut self);

    fn update(&mut self) -> Result<(), TaskError>;

    /// Called once after [`has_completed`](Self::has_completed) reported true.
    fn end(&mut self);

    /// Called once when the task is cancelled or failed.
    fn stop(&mut self);

    fn has_completed(&self) -> bool;

    /// Polled every cycle; true cancels the task with [`stop`](Self::stop).
    fn should_cancel(&self) -> bool {
        false
    }

    /// The value the task drives `operation` to, if any.
    fn value(&self, _operation: O) -> Option<Value> {
        None
    }
}

/// Builds a fresh task for every activation of a macro.
pub trait TaskFactory<O: Key> {
    fn create(&mut self, operation: O) -> Option<Box<dyn Task<O>>>;
}

impl<O, F> TaskFactory<O> for F
where
    O: Key,
    F: FnMut(O) -> Option<Box<dyn Task<O>>>,
{
    fn create(&mut self, operation: O) -> Option<Box<dyn Task<O>>> {
        self(operation)
    }
}

/// Builds [`ScriptedTask`]s from the scripts in the bindings.
#[derive(Debug, Clone)]
pub struct ScriptedTasks<O: Key> {
    scripts: AHashMap<O, Rc<[ScriptStep<O>]>>,
}

impl<O: Key> ScriptedTasks<O> {
    pub fn from_bindings<S: Key>(bindings: &Bindings<O, S>) -> Self {
        let scripts = bindings
            .macros()
            .iter()
            .filter(|(_, description)| !description.script.is_empty())
            .map(|(op, description)| (*op, Rc::<[ScriptStep<O>]>::from(description.script.as_slice())))
            .collect();
        Self { scripts }
    }

    pub fn has_script(&self, operation: O) -> bool {
        self.scripts.contains_key(&operation)
    }
}

impl<O: Key> TaskFactory<O> for ScriptedTasks<O> {
    fn create(&mut self, operation: O) -> Option<Box<dyn Task<O>>> {
        let steps = self.scripts.get(&operation)?;
        Some(Box::new(ScriptedTask::new(Rc::clone(steps))))
    }
}

/// Holds the values of each script step for its number of cycles.
#[derive(Debug, Clone)]
pub struct ScriptedTask<O: Key> {
    steps: Rc<[ScriptStep<O>]>,
    step: usize,
    elapsed: u32,
}

impl<O: Key> ScriptedTask<O> {
    pub fn new(steps: Rc<[ScriptStep<O>]>) -> Self {
        Self {
            steps,
            step: 0,
            elapsed: 0,
        }
    }

    fn skip_empty_steps(&mut self) {
        while self.steps.get(self.step).is_some_and(|s| s.cycles == 0) {
            self.step += 1;
        }
    }
}

impl<O: Key> Task<O> for ScriptedTask<O> {
    fn begin(&mut self) {
        self.step = 0;
        self.elapsed = 0;
        self.skip_empty_steps();
    }

    fn update(&mut self) -> Result<(), TaskError> {
        let Some(step) = self.steps.get(self.step) else {
            return Ok(());
        };
        self.elapsed += 1;
        if self.elapsed >= step.cycles {
            self.step += 1;
            self.elapsed = 0;
            self.skip_empty_steps();
        }
        Ok(())
    }

    fn end(&mut self) {}

    fn stop(&mut self) {
        self.step = self.steps.len();
    }

    fn has_completed(&self) -> bool {
        self.step >= self.steps.len()
    }

    fn value(&self, operation: O) -> Option<Value> {
        self.steps.get(self.step)?.value(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opshift_bit_derive::Key;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Key)]
    enum Op {
        Lift,
        Power,
    }

    fn script() -> Rc<[ScriptStep<Op>]> {
        Rc::from(vec![
            ScriptStep::new(2).set(Op::Lift, Value::Digital(true)),
            ScriptStep::new(0).set(Op::Power, Value::Analog(9.0)),
            ScriptStep::new(1).set(Op::Power, Value::Analog(0.5)),
        ])
    }

    #[test]
    fn scripted_task_holds_each_step_for_its_cycles() {
        let mut task = ScriptedTask::new(script());
        task.begin();

        assert_eq!(task.value(Op::Lift), Some(Value::Digital(true)));
        assert_eq!(task.value(Op::Power), None);
        task.update().expect("update");
        assert_eq!(task.value(Op::Lift), Some(Value::Digital(true)));

        // The zero-cycle step is never observed.
        task.update().expect("update");
        assert_eq!(task.value(Op::Power), Some(Value::Analog(0.5)));
        assert!(!task.has_completed());

        task.update().expect("update");
        assert!(task.has_completed());
        assert_eq!(task.value(Op::Power), None);
    }

    #[test]
    fn stopped_task_reports_no_values() {
        let mut task = ScriptedTask::new(script());
        task.begin();
        task.stop();
        assert!(task.has_completed());
        assert_eq!(task.value(Op::Lift), None);
    }

    #[test]
    fn closures_are_task_factories() {
        let mut created = Vec::new();
        let mut factory = |op: Op| -> Option<Box<dyn Task<Op>>> {
            created.push(op);
            Some(Box::new(ScriptedTask::new(script())))
        };
        assert!(TaskFactory::create(&mut factory, Op::Lift).is_some());
        drop(factory);
        assert_eq!(created, vec![Op::Lift]);
    }
}
