use crate::{
    collect::{Collector, Console},
    compute::aggregate,
    data::Config,
    report::write_summary,
    store::RecordStore,
};
use log::{debug, error};
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

/// Where the interactive loop stands. `Add` and `Summary` always fall back
/// to `Menu` once their flow is over, whatever happened inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Menu,
    Add,
    Summary,
    Exit,
}

impl State {
    /// The state a main-menu answer leads to, if the answer is valid.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice {
            "1" => Some(State::Add),
            "2" => Some(State::Summary),
            "3" => Some(State::Exit),
            _ => None,
        }
    }
}

/// The interactive expense tracker.
pub(crate) struct Menu<S, R, W> {
    path: PathBuf,
    categories: Vec<String>,
    collector: Collector,
    store: S,
    console: Console<R, W>,
}

impl<S: RecordStore, R: BufRead, W: Write> Menu<S, R, W> {
    pub fn new(config: &Config, store: S, console: Console<R, W>) -> Self {
        Self {
            path: config.path.clone(),
            categories: config.categories.clone(),
            collector: Collector::new(config),
            store,
            console,
        }
    }

    /// Runs until the user picks exit. Running out of input ends the session
    /// the same way; only a broken console is an error.
    pub fn run(&mut self) -> io::Result<()> {
        self.initialize()?;
        match self.run_loop() {
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                debug!("input closed, leaving");
                Ok(())
            }
            result => result,
        }
    }

    fn initialize(&mut self) -> io::Result<()> {
        match self.store.ensure_initialized() {
            Ok(true) => writeln!(
                self.console.output(),
                "Created new data file: {}",
                self.path.display()
            ),
            Ok(false) => Ok(()),
            Err(e) => {
                error!("cannot initialize {}: {e}", self.path.display());
                writeln!(
                    self.console.output(),
                    "❌ Could not create data file {}: {e}",
                    self.path.display()
                )
            }
        }
    }

    fn run_loop(&mut self) -> io::Result<()> {
        let mut state = State::Menu;
        loop {
            state = match state {
                State::Menu => self.choose()?,
                State::Add => {
                    self.add()?;
                    State::Menu
                }
                State::Summary => {
                    self.summary()?;
                    State::Menu
                }
                State::Exit => {
                    writeln!(
                        self.console.output(),
                        "\n👋 Thank you for using the tracker. Goodbye!"
                    )?;
                    return Ok(());
                }
            };
        }
    }

    fn choose(&mut self) -> io::Result<State> {
        let out = self.console.output();
        writeln!(out, "\n===============================")?;
        writeln!(out, "    DAILY EXPENSE TRACKER")?;
        writeln!(out, "===============================")?;
        writeln!(out, "1. Add New Expense")?;
        writeln!(out, "2. View Summary Report")?;
        writeln!(out, "3. Exit")?;
        let choice = self.console.prompt("Enter your choice (1/2/3): ")?;
        match State::from_choice(&choice) {
            Some(state) => Ok(state),
            None => {
                writeln!(
                    self.console.output(),
                    "\n🛑 Invalid choice. Please enter 1, 2, or 3."
                )?;
                Ok(State::Menu)
            }
        }
    }

    fn add(&mut self) -> io::Result<()> {
        writeln!(self.console.output(), "\n--- Add New Expense ---")?;
        let expense = self.collector.collect_expense(&mut self.console)?;
        match self.store.append(&expense) {
            Ok(()) => writeln!(self.console.output(), "\n✅ Expense successfully recorded!"),
            Err(e) => {
                error!("append to {} failed: {e}", self.path.display());
                writeln!(self.console.output(), "❌ Error writing to file: {e}")
            }
        }
    }

    fn summary(&mut self) -> io::Result<()> {
        writeln!(self.console.output(), "\n--- Expense Summary ---")?;
        let rows = match self.store.read_all() {
            Ok(Some(rows)) => rows,
            Ok(None) => {
                return writeln!(
                    self.console.output(),
                    "No expense data found. Add an expense first."
                )
            }
            Err(e) => return self.read_failed(e),
        };
        match aggregate(&self.categories, rows, self.console.output()) {
            Ok(summary) => write_summary(self.console.output(), &summary),
            Err(e) => self.read_failed(e),
        }
    }

    fn read_failed(&mut self, e: impl std::fmt::Display) -> io::Result<()> {
        error!("reading {} failed: {e}", self.path.display());
        writeln!(
            self.console.output(),
            "❌ An error occurred while reading the file: {e}"
        )
    }
}
