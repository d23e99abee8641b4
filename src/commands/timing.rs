//! Per-command timing
//!
//! Records when a command started, when the store answered and when the
//! output was written. Shown after each command while `\t` is on.

use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Timing {
    started: Instant,
    executed: Option<Instant>,
    printed: Option<Instant>,
}

impl Timing {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            executed: None,
            printed: None,
        }
    }

    /// Mark the store round trip as done
    pub fn executed(&mut self) {
        self.executed = Some(Instant::now());
    }

    /// Mark the output as written
    pub fn printed(&mut self) {
        self.printed = Some(Instant::now());
    }

    /// Time spent in the query and on the network
    pub fn query_duration(&self) -> Option<Duration> {
        self.executed.map(|at| at.duration_since(self.started))
    }

    /// Time spent rendering the result
    pub fn display_duration(&self) -> Option<Duration> {
        match (self.executed, self.printed) {
            (Some(executed), Some(printed)) => Some(printed.duration_since(executed)),
            _ => None,
        }
    }
}

fn phase(duration: Option<Duration>) -> String {
    duration.map_or_else(|| "unknown".to_string(), |d| format!("{d:?}"))
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "query+network: {}\ndisplaying   : {}",
            phase(self.query_duration()),
            phase(self.display_duration())
        )
    }
}
