use std::time::Duration;

use ahash::AHashMap;
use crossbeam_channel::{select, Receiver};
use smallvec::SmallVec;

use opshift_bindings::{Bindings, Value};
use opshift_bit_mask::Key;
use opshift_device::{DeviceRef, DeviceSet, VirtualDevice};

use crate::app::{Driver, DriverError, ScriptedTasks};
use crate::trace::{Trace, TraceFrame};
use crate::{print_debug, print_info, print_warning};

/// An operation whose value differs from the previous cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change<O> {
    pub operation: O,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaySummary {
    pub cycles: u64,
    pub changes: u64,
    pub macro_starts: u64,
    pub task_failures: u64,
}

/// Feeds recorded frames through a [`Driver`] wired to virtual devices.
pub struct Replay<O: Key, S: Key> {
    driver: Driver<O, S>,
    pads: [VirtualDevice; 3],
    values: AHashMap<O, Value>,
    summary: ReplaySummary,
}

impl<O: Key, S: Key> Replay<O, S> {
    /// Builds a driver whose macros run the scripts of `bindings`.
    pub fn new(bindings: Bindings<O, S>) -> Result<Self, DriverError> {
        let pads = [VirtualDevice::new(), VirtualDevice::new(), VirtualDevice::new()];
        let devices = DeviceSet::new()
            .with(DeviceRef::Driver, pads[0].clone())?
            .with(DeviceRef::CoDriver, pads[1].clone())?
            .with(DeviceRef::Sensor, pads[2].clone())?;
        let tasks = ScriptedTasks::from_bindings(&bindings);
        let driver = Driver::new(bindings, devices, tasks)?;

        let values = O::ALL
            .iter()
            .filter_map(|op| Some((*op, driver.value(*op)?)))
            .collect();

        Ok(Self {
            driver,
            pads,
            values,
            summary: ReplaySummary::default(),
        })
    }

    pub fn driver(&self) -> &Driver<O, S> {
        &self.driver
    }

    pub fn summary(&self) -> ReplaySummary {
        self.summary
    }

    /// Runs one cycle on `frame` and returns the operations that changed.
    pub fn step(&mut self, frame: &TraceFrame) -> SmallVec<[Change<O>; 8]> {
        self.pads[0].load(frame.driver);
        self.pads[1].load(frame.co_driver);
        self.pads[2].load(frame.sensor);

        self.summary.cycles += 1;
        let activations = self.driver.activations();
        if let Err(e) = self.driver.update() {
            print_warning!("cycle {}: {e}", self.summary.cycles);
            self.summary.task_failures += 1;
        }
        self.summary.macro_starts += self.driver.activations() - activations;

        let mut changes: SmallVec<[Change<O>; 8]> = SmallVec::new();
        for (operation, previous) in &mut self.values {
            let Some(value) = self.driver.value(*operation) else {
                continue;
            };
            if value == *previous {
                continue;
            }
            *previous = value;
            changes.push(Change {
                operation: *operation,
                value,
            });
        }
        changes.sort_by_key(|change| change.operation.index());
        self.summary.changes += changes.len() as u64;
        changes
    }

    /// Replays the whole trace, then stops the driver.
    ///
    /// With `period` set, cycles are paced by a ticker and a message on `stop`
    /// ends the replay early.
    pub fn run(
        &mut self,
        trace: &Trace,
        period: Option<Duration>,
        stop: &Receiver<()>,
    ) -> ReplaySummary {
        let ticker = period.map(crossbeam_channel::tick);
        for frame in trace.iter_cycles() {
            if let Some(ticker) = &ticker {
                select! {
                    recv(stop) -> _ => {
                        print_warning!("replay interrupted");
                        break;
                    }
                    recv(ticker) -> _ => {}
                }
            } else if stop.try_recv().is_ok() {
                print_warning!("replay interrupted");
                break;
            }

            for change in self.step(frame) {
                print_info!(
                    "cycle {} - {} = {}",
                    self.summary.cycles,
                    change.operation.name(),
                    change.value
                );
            }
        }

        self.driver.stop();
        print_debug!("replay finished after {} cycles", self.summary.cycles);
        self.summary
    }
}
