//! Bus statistics collection and reporting.
//!
//! This module tracks what the fabric did over a run. It provides:
//! 1. **Transactions:** Read and write requests accepted and beats completed.
//! 2. **Errors:** Decode errors answered on each channel.
//! 3. **Exclusive access:** Locked reads, store-conditional outcomes, and reservation churn.

use std::time::Instant;

/// Counters updated by the read and write engines and the exclusive monitor.
#[derive(Clone, Debug)]
pub struct BusStats {
    start_time: Instant,
    /// Clock cycles simulated (set by the harness).
    pub cycles: u64,

    /// Read requests accepted on the `ar` channel.
    pub read_txns: u64,
    /// Write requests accepted on the `aw` channel.
    pub write_txns: u64,
    /// Read beats acknowledged by the master.
    pub read_beats: u64,
    /// Write data beats accepted from the master.
    pub write_beats: u64,

    /// Read bursts terminated with a decode error.
    pub read_decode_errors: u64,
    /// Write bursts answered with a decode error.
    pub write_decode_errors: u64,

    /// Locked read beats acknowledged.
    pub exclusive_reads: u64,
    /// Locked write beats that found their reservation and were performed.
    pub exclusive_write_success: u64,
    /// Locked write beats dropped because no matching reservation was live.
    pub exclusive_write_failure: u64,

    /// Reservations installed by locked reads.
    pub reservations_installed: u64,
    /// Live reservations overwritten because the table was full.
    pub reservations_evicted: u64,
    /// Reservations cleared by conflicting writes.
    pub reservations_invalidated: u64,
}

impl Default for BusStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            read_txns: 0,
            write_txns: 0,
            read_beats: 0,
            write_beats: 0,
            read_decode_errors: 0,
            write_decode_errors: 0,
            exclusive_reads: 0,
            exclusive_write_success: 0,
            exclusive_write_failure: 0,
            reservations_installed: 0,
            reservations_evicted: 0,
            reservations_invalidated: 0,
        }
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"transactions"`, `"exclusive"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "transactions", "exclusive"];

impl BusStats {
    /// Total decode errors on both channels.
    pub fn decode_errors(&self) -> u64 {
        self.read_decode_errors + self.write_decode_errors
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Pass an empty slice to print all sections (same as `print()`).
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let seconds = self.start_time.elapsed().as_secs_f64();

        if want("summary") {
            let khz = if seconds > 0.0 {
                (self.cycles as f64 / seconds) / 1000.0
            } else {
                0.0
            };
            println!("\n==========================================================");
            println!("AXI FABRIC STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {:.4} s", seconds);
            println!("sim_cycles               {}", self.cycles);
            println!("sim_freq                 {:.2} kHz", khz);
            println!("----------------------------------------------------------");
        }
        if want("transactions") {
            println!("TRANSACTIONS");
            println!("  read.txns              {}", self.read_txns);
            println!("  read.beats             {}", self.read_beats);
            println!("  read.decerr            {}", self.read_decode_errors);
            println!("  write.txns             {}", self.write_txns);
            println!("  write.beats            {}", self.write_beats);
            println!("  write.decerr           {}", self.write_decode_errors);
            println!("----------------------------------------------------------");
        }
        if want("exclusive") {
            let attempts = self.exclusive_write_success + self.exclusive_write_failure;
            let rate = if attempts == 0 {
                0.0
            } else {
                (self.exclusive_write_success as f64 / attempts as f64) * 100.0
            };
            println!("EXCLUSIVE ACCESS");
            println!("  lr.beats               {}", self.exclusive_reads);
            println!(
                "  sc.success             {} ({:.2}%)",
                self.exclusive_write_success, rate
            );
            println!("  sc.failure             {}", self.exclusive_write_failure);
            println!("  resv.installed         {}", self.reservations_installed);
            println!("  resv.evicted           {}", self.reservations_evicted);
            println!("  resv.invalidated       {}", self.reservations_invalidated);
            println!("==========================================================");
        }
    }

    /// Prints all sections.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
