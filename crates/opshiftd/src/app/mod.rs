mod driver;
mod error;
mod evaluator;
mod input;
mod macro_state;
mod shift;
mod state;
mod task;

pub use driver::Driver;
pub use error::DriverError;
pub use evaluator::ButtonEvaluator;
pub use macro_state::{MacroOperationState, MacroPhase, MacroStep};
pub use shift::resolve_active_shifts;
pub use state::{OperationState, Ownership};
pub use task::{ScriptedTask, ScriptedTasks, Task, TaskError, TaskFactory};
