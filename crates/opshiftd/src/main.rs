mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::unbounded;

use opshift_bindings::{load_bindings, Bindings};
use opshift_bit_mask::Named;
use opshift_device::DeviceRef;
use opshiftd::app::ScriptedTasks;
use opshiftd::operations::{Operation, Shift};
use opshiftd::replay::Replay;
use opshiftd::trace::Trace;
use opshiftd::{logging, print_debug, print_error, print_info, print_warning};

use crate::cli::{Cli, Command};

fn load(path: &Path) -> Option<Bindings<Operation, Shift>> {
    match load_bindings(path) {
        Ok(bindings) => Some(bindings),
        Err(e) => {
            print_error!("failed to load bindings {}: {e}", path.display());
            None
        }
    }
}

fn check(path: &Path) -> ExitCode {
    let Some(bindings) = load(path) else {
        return ExitCode::FAILURE;
    };

    let devices = bindings
        .devices()
        .iter()
        .map(DeviceRef::name)
        .collect::<Vec<_>>()
        .join(", ");
    print_info!(
        "bindings ok - {} operations, {} macros, {} shifts, devices: {devices}",
        bindings.operations().count(),
        bindings.macros().len(),
        bindings.shifts().len(),
    );
    let scripts = ScriptedTasks::from_bindings(&bindings);
    for (op, description) in bindings.macros() {
        print_debug!("macro {} affects {:?}", op.name(), description.affected);
        if !scripts.has_script(*op) {
            print_warning!("macro {} has no script, replay will not start it", op.name());
        }
    }
    for op in Operation::ALL {
        if bindings.operation(*op).is_none() && bindings.macro_description(*op).is_none() {
            print_debug!("operation {} is not bound", op.name());
        }
    }
    ExitCode::SUCCESS
}

fn replay(bindings: &Path, trace: &Path, period_ms: u64, realtime: bool) -> ExitCode {
    let Some(bindings) = load(bindings) else {
        return ExitCode::FAILURE;
    };
    let trace = match Trace::load(trace) {
        Ok(trace) => trace,
        Err(e) => {
            print_error!("failed to load trace {}: {e}", trace.display());
            return ExitCode::FAILURE;
        }
    };
    let mut replay = match Replay::new(bindings) {
        Ok(replay) => replay,
        Err(e) => {
            print_error!("failed to start driver: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Ctrl+C ends a paced replay between cycles.
    let (stop_tx, stop_rx) = unbounded::<()>();
    if realtime {
        if let Err(e) = ctrlc::set_handler(move || {
            let _ = stop_tx.send(());
        }) {
            print_error!("failed to set Ctrl+C handler: {e}");
            return ExitCode::FAILURE;
        }
    }

    let period = realtime.then(|| Duration::from_millis(period_ms));
    print_info!("replaying {} cycles", trace.cycles());
    let summary = replay.run(&trace, period, &stop_rx);
    print_info!(
        "replay done - {} cycles, {} changes, {} macro starts, {} task failures",
        summary.cycles,
        summary.changes,
        summary.macro_starts,
        summary.task_failures
    );

    if summary.task_failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::setup(cli.verbose, cli.no_color).expect("Unable to set up logger");

    match cli.command {
        Command::Check { bindings } => check(&bindings),
        Command::Replay {
            bindings,
            trace,
            period_ms,
            realtime,
        } => replay(&bindings, &trace, period_ms, realtime),
    }
}
