//! Clock loop driving an external CPU model against the system.
//!
//! The model is opaque: the harness only toggles its clock and reset, exchanges AXI wires
//! and interrupt lines with it, and asks it to evaluate. Each clock cycle:
//!
//! 1. Reset is held for the first `reset_cycles` cycles.
//! 2. Rising edge, then `eval`.
//! 3. Slave-driven wires are cleared and the wall-clock time is presented.
//! 4. Out of reset: master wires are sampled into a fresh `AxiSignals`, the system steps
//!    once, and the responses and interrupt lines are driven back.
//! 5. Falling edge, then `eval`.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::common::SimError;
use crate::config::Config;
use crate::soc::System;
use crate::soc::signals::AxiSignals;
use crate::soc::traits::IrqLines;
use crate::stats::BusStats;

/// The synchronous CPU model under test.
pub trait CpuModel {
    /// Drives the clock input.
    fn set_clock(&mut self, high: bool);

    /// Drives the reset input.
    fn set_reset(&mut self, asserted: bool);

    /// Evaluates the model after an input change.
    fn eval(&mut self);

    /// True once the model has requested the end of simulation.
    fn finished(&self) -> bool {
        false
    }

    /// Copies the master-driven wires (valid/address/data on requests, ready on responses).
    fn sample_bus(&self, sig: &mut AxiSignals);

    /// Drives the slave-driven wires (ready on requests, valid/data on responses).
    fn drive_bus(&mut self, sig: &AxiSignals);

    /// Deasserts every slave-driven wire.
    fn clear_bus(&mut self) {
        self.drive_bus(&AxiSignals::default());
    }

    /// Drives the interrupt lines.
    fn drive_interrupts(&mut self, irq: &IrqLines);

    /// Presents the host wall-clock time in seconds since the Unix epoch.
    fn set_time(&mut self, _seconds: u64) {}
}

/// Outcome of a run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Clock cycles simulated.
    pub cycles: u64,
    /// The model asked to stop before `max_clock`.
    pub finished: bool,
    /// Fabric counters at the end of the run.
    pub stats: BusStats,
}

/// Owns a model and the system it is attached to.
#[derive(Debug)]
pub struct Simulator<M> {
    /// The model under test.
    pub model: M,
    /// The platform the model talks to.
    pub system: System,
    config: Config,
    cycle: u64,
}

impl<M: CpuModel> Simulator<M> {
    /// Builds the standard system from `config` and attaches `model`.
    ///
    /// # Errors
    ///
    /// Propagates [`System::new`] failures.
    pub fn new(model: M, config: Config) -> Result<Self, SimError> {
        let system = System::new(&config)?;
        Ok(Self::with_system(model, system, config))
    }

    /// Attaches `model` to an already built system.
    pub fn with_system(model: M, system: System, config: Config) -> Self {
        Self {
            model,
            system,
            config,
            cycle: 0,
        }
    }

    /// Clock cycles simulated so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Runs one full clock cycle.
    pub fn tick(&mut self) {
        let in_reset = self.cycle < self.config.sim.reset_cycles;
        self.model.set_reset(in_reset);

        self.model.set_clock(true);
        self.model.eval();
        self.model.clear_bus();
        self.model.set_time(unix_seconds());

        if !in_reset {
            let mut sig = AxiSignals::default();
            self.model.sample_bus(&mut sig);
            let irq = self.system.step(&mut sig);
            if self.config.sim.trace_bus {
                tracing::trace!("cycle {:#x}\n{sig}", self.cycle);
            }
            self.model.drive_bus(&sig);
            self.model.drive_interrupts(&irq);
        }

        self.model.set_clock(false);
        self.model.eval();

        self.cycle += 1;
        self.system.fabric.stats_mut().cycles = self.cycle;
    }

    /// Runs until `max_clock` cycles or until the model finishes, then writes the RAM
    /// dump if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] if the RAM dump cannot be written.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        let max = self.config.sim.max_clock;
        tracing::info!("simulation start: max_clock={max:#x}");
        while self.cycle < max && !self.model.finished() {
            self.tick();
        }
        let finished = self.model.finished();
        tracing::info!(
            "simulation end after {} cycles ({})",
            self.cycle,
            if finished { "model finished" } else { "clock limit" }
        );

        if let Some(path) = &self.config.sim.ram_dump {
            self.system.dump_ram(path)?;
        }

        Ok(RunSummary {
            cycles: self.cycle,
            finished,
            stats: self.system.fabric.stats().clone(),
        })
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
