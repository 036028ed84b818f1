//! Console reporter - a run listener that prints progress and a summary

use colored::*;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use trellis_core::{Description, Failure, RunListener, RunResult};

/// Prints one character (or one line with `verbose`) per test, then a summary
pub struct ConsoleReporter {
    /// Show one line per test instead of progress dots
    verbose: bool,
    /// Print durations; off for reproducible output
    timing: bool,
    state: Mutex<ReporterState>,
}

struct ReporterState {
    out: Box<dyn Write + Send>,
    /// Tests that already printed a failure or assumption marker
    reported: HashSet<String>,
    started: HashMap<String, Instant>,
}

impl ConsoleReporter {
    /// Create a reporter writing to stdout
    pub fn new(verbose: bool) -> Self {
        Self::with_writer(verbose, io::stdout())
    }

    pub fn with_writer(verbose: bool, out: impl Write + Send + 'static) -> Self {
        Self {
            verbose,
            timing: true,
            state: Mutex::new(ReporterState {
                out: Box::new(out),
                reported: HashSet::new(),
                started: HashMap::new(),
            }),
        }
    }

    /// Leave durations out of the output
    pub fn without_timing(mut self) -> Self {
        self.timing = false;
        self
    }

    fn state(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Print a single test outcome
    fn print_outcome(
        &self,
        state: &mut ReporterState,
        marker: ColoredString,
        label: ColoredString,
        description: &Description,
        detail: Option<String>,
    ) -> io::Result<()> {
        if !self.verbose {
            write!(state.out, "{}", marker)?;
            return state.out.flush();
        }

        write!(state.out, "{} {}", label, description.display_name())?;
        let elapsed = state.started.remove(description.unique_id()).map(|t| t.elapsed());
        if let (true, Some(elapsed)) = (self.timing, elapsed) {
            write!(state.out, " ({:.2?})", elapsed)?;
        }
        if let Some(detail) = detail {
            write!(state.out, " - {}", detail)?;
        }
        writeln!(state.out)
    }

    fn print_summary(&self, out: &mut dyn Write, result: &RunResult) -> io::Result<()> {
        writeln!(out, "{}", "─".repeat(50))?;

        let status = if result.was_successful() {
            "PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };
        let failed = result.failure_count();

        writeln!(
            out,
            "Test result: {} | {} run, {} failed, {} ignored, {} skipped",
            status,
            result.run_count().to_string().bold(),
            if failed > 0 {
                failed.to_string().red().bold()
            } else {
                failed.to_string().normal()
            },
            result.ignore_count(),
            result.assumption_failure_count()
        )?;
        if self.timing {
            writeln!(out, "Time: {:.2?}", result.run_time())?;
        }
        Ok(())
    }

    fn print_failures(&self, out: &mut dyn Write, failures: &[Failure]) -> io::Result<()> {
        if failures.is_empty() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "{}", "Failures:".red().bold())?;

        for failure in failures {
            writeln!(out)?;
            writeln!(out, "  {} {}", "●".red(), failure.test_header().bold())?;
            for line in failure.trace().lines() {
                writeln!(out, "      {}", line.dimmed())?;
            }
        }
        Ok(())
    }
}

impl RunListener for ConsoleReporter {
    fn test_run_started(&self, description: &Description) -> anyhow::Result<()> {
        let mut state = self.state();
        state.reported.clear();
        state.started.clear();
        writeln!(state.out, "Running {} tests", description.test_count())?;
        writeln!(state.out)?;
        Ok(())
    }

    fn test_run_finished(&self, result: &RunResult) -> anyhow::Result<()> {
        let mut state = self.state();
        let out = &mut state.out;
        if !self.verbose {
            writeln!(out)?;
        }
        writeln!(out)?;
        self.print_summary(&mut *out, result)?;
        self.print_failures(&mut *out, &result.failures())?;
        out.flush()?;
        Ok(())
    }

    fn test_started(&self, description: &Description) -> anyhow::Result<()> {
        self.state()
            .started
            .insert(description.unique_id().to_string(), Instant::now());
        Ok(())
    }

    fn test_finished(&self, description: &Description) -> anyhow::Result<()> {
        let mut state = self.state();
        if state.reported.remove(description.unique_id()) {
            state.started.remove(description.unique_id());
            return Ok(());
        }
        self.print_outcome(
            &mut state,
            ".".green(),
            "PASS".green().bold(),
            description,
            None,
        )?;
        Ok(())
    }

    fn test_failure(&self, failure: &Failure) -> anyhow::Result<()> {
        let mut state = self.state();
        let description = failure.description();
        state.reported.insert(description.unique_id().to_string());
        self.print_outcome(
            &mut state,
            "F".red().bold(),
            "FAIL".red().bold(),
            description,
            None,
        )?;
        Ok(())
    }

    fn test_assumption_failure(&self, failure: &Failure) -> anyhow::Result<()> {
        let mut state = self.state();
        let description = failure.description();
        state.reported.insert(description.unique_id().to_string());
        self.print_outcome(
            &mut state,
            "A".yellow().bold(),
            "SKIP".yellow().bold(),
            description,
            Some(failure.message()),
        )?;
        Ok(())
    }

    fn test_ignored(&self, description: &Description) -> anyhow::Result<()> {
        let mut state = self.state();
        self.print_outcome(
            &mut state,
            "I".yellow(),
            "IGNORED".yellow().bold(),
            description,
            None,
        )?;
        Ok(())
    }
}
