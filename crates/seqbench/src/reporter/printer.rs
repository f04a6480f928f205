//! Reporter implementation printing output to `stderr` in human-readable form.

use std::{
    fmt, io, ops,
    sync::{Arc, Mutex},
    time::Instant,
};

use anes::{
    Attribute, Color, ResetAttributes, SetAttribute, SetBackgroundColor, SetForegroundColor,
};

use super::Reporter;
use crate::{Outcome, RoundSummary, SessionId, SessionOutput};

/// Full width of the label column.
const LABEL_WIDTH: usize = 15;
/// Full width of the number column.
const NUMBER_WIDTH: usize = 16;

#[derive(Debug, Clone, Copy)]
enum Checkmark {
    InProgress,
    Pass,
    Exhausted,
    Fail,
}

#[derive(Debug)]
struct Styled<'a, W: io::Write>(&'a mut LinePrinter<W>);

impl<W: io::Write> ops::Deref for Styled<'_, W> {
    type Target = LinePrinter<W>;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<W: io::Write> ops::DerefMut for Styled<'_, W> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0
    }
}

impl<W: io::Write> Drop for Styled<'_, W> {
    fn drop(&mut self) {
        if self.0.style_nesting > 0 {
            self.0.style_nesting -= 1;
            if self.0.style_nesting == 0 {
                self.0.print(format_args!("{ResetAttributes}"));
            }
        }
    }
}

#[derive(Debug)]
struct LinePrinter<W> {
    inner: W,
    styling: bool,
    style_nesting: usize,
}

impl<W: io::Write> LinePrinter<W> {
    fn borrow(&mut self) -> Styled<'_, W> {
        if self.styling {
            self.style_nesting += 1;
        }
        Styled(self)
    }

    fn print(&mut self, args: fmt::Arguments<'_>) {
        self.inner
            .write_fmt(args)
            .expect("I/O error writing to stderr");
    }

    fn print_str(&mut self, s: &str) {
        self.inner
            .write_all(s.as_bytes())
            .expect("I/O error writing to stderr");
    }

    fn fg(&mut self, color: Color) -> Styled<'_, W> {
        if self.styling {
            self.print(format_args!("{}", SetForegroundColor(color)));
        }
        self.borrow()
    }

    fn bg(&mut self, color: Color) -> Styled<'_, W> {
        if self.styling {
            self.print(format_args!("{}", SetBackgroundColor(color)));
        }
        self.borrow()
    }

    fn bold(&mut self) -> Styled<'_, W> {
        if self.styling {
            self.print(format_args!("{}", SetAttribute(Attribute::Bold)));
        }
        self.borrow()
    }

    fn dimmed(&mut self) -> Styled<'_, W> {
        if self.styling {
            self.print(format_args!("{}", SetAttribute(Attribute::Faint)));
        }
        self.borrow()
    }

    fn print_checkbox(&mut self, mark: Checkmark) {
        self.print_str("[");
        match mark {
            Checkmark::InProgress => self.fg(Color::Cyan).print_str("*"),
            Checkmark::Pass => self.bold().fg(Color::Green).print_str("√"),
            Checkmark::Exhausted => self.bold().fg(Color::Yellow).print_str("~"),
            Checkmark::Fail => self.bold().fg(Color::Red).print_str("x"),
        }
        self.print_str("] ");
    }

    fn print_debug(&mut self, args: fmt::Arguments<'_>) {
        self.bold()
            .bg(Color::DarkMagenta)
            .fg(Color::White)
            .print_str("DEBUG:");
        self.print(format_args!(" {args}\n"));
    }

    fn print_warning(&mut self, id: Option<&SessionId>, args: fmt::Arguments<'_>) {
        self.bold()
            .bg(Color::Yellow)
            .fg(Color::White)
            .print_str(" WARN:");
        if let Some(id) = id {
            self.print(format_args!(" {id}:"));
        }
        self.print(format_args!(" {args}\n"));
    }

    fn print_error(&mut self, name: Option<&dyn fmt::Display>, args: fmt::Arguments<'_>) {
        self.bold()
            .bg(Color::Red)
            .fg(Color::White)
            .print_str("ERROR:");
        if let Some(name) = name {
            self.print(format_args!(" {name}:"));
        }
        self.print(format_args!(" {args}\n"));
    }

    fn print_row(&mut self, label: &str, last: bool, value: &str) {
        const ROW_LABEL_WIDTH: usize = LABEL_WIDTH - 2;

        let line = if last { '└' } else { '├' };
        self.print(format_args!(
            "{line} {label:<ROW_LABEL_WIDTH$} {value:>NUMBER_WIDTH$}\n"
        ));
    }
}

fn format_beta(beta: f64) -> String {
    if beta.is_finite() {
        format!("{:.2}%", beta * 100.0)
    } else {
        "n/a".to_owned()
    }
}

/// Verbosity of the printed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

#[derive(Debug)]
pub(crate) struct PrintingReporter<W = io::Stderr> {
    verbosity: Verbosity,
    line_printer: Arc<Mutex<LinePrinter<W>>>,
}

impl<W> Clone for PrintingReporter<W> {
    fn clone(&self) -> Self {
        Self {
            verbosity: self.verbosity,
            line_printer: self.line_printer.clone(),
        }
    }
}

impl PrintingReporter {
    pub(crate) fn new(styling: bool, verbosity: Verbosity) -> Self {
        let line_printer = LinePrinter {
            inner: io::stderr(),
            styling,
            style_nesting: 0,
        };
        Self {
            verbosity,
            line_printer: Arc::new(Mutex::new(line_printer)),
        }
    }

    pub(crate) fn report_list_item(name: &str) {
        println!("{name}: benchmark");
    }
}

impl<W: io::Write> PrintingReporter<W> {
    fn lock_printer(&self) -> impl ops::DerefMut<Target = LinePrinter<W>> + '_ {
        self.line_printer.lock().expect("line printer is poisoned")
    }

    pub(crate) fn report_debug(&self, args: fmt::Arguments<'_>) {
        if self.verbosity < Verbosity::Verbose {
            return;
        }
        self.lock_printer().print_debug(args);
    }

    pub(crate) fn report_error(&self, name: Option<&dyn fmt::Display>, err: &dyn fmt::Display) {
        self.lock_printer().print_error(name, format_args!("{err}"));
    }

    fn report_warning(&self, id: Option<&SessionId>, warning: &dyn fmt::Display) {
        self.lock_printer()
            .print_warning(id, format_args!("{warning}"));
    }
}

#[derive(Debug)]
struct TestReporter<W> {
    parent: PrintingReporter<W>,
    name: String,
    started_at: Instant,
}

impl<W: io::Write> super::TestReporter for TestReporter<W> {
    fn ok(self: Box<Self>) {
        let mut printer = self.parent.lock_printer();
        printer.print_checkbox(Checkmark::Pass);
        let latency = self.started_at.elapsed();
        printer.print(format_args!("{} ({latency:?})\n", self.name));
    }

    fn fail(self: Box<Self>, error: &dyn fmt::Display) {
        let mut printer = self.parent.lock_printer();
        printer.print_checkbox(Checkmark::Fail);
        printer.print(format_args!("{}: ", self.name));
        printer.bold().fg(Color::Red).print_str("FAILED");
        printer.print(format_args!(" ({error})\n"));
    }
}

#[derive(Debug)]
struct SessionReporter<W> {
    parent: PrintingReporter<W>,
    id: SessionId,
    started_at: Option<Instant>,
}

impl<W: io::Write + fmt::Debug + Send> super::SessionReporter for SessionReporter<W> {
    fn start_execution(&mut self) {
        self.started_at = Some(Instant::now());
    }

    fn round_completed(&mut self, round: &RoundSummary) {
        if self.parent.verbosity < Verbosity::Verbose {
            return;
        }

        let mut printer = self.parent.lock_printer();
        printer.print_checkbox(Checkmark::InProgress);
        printer.print(format_args!(
            "{}: round {} (+{} trials): floor {}, rel. error {}\n",
            self.id,
            round.round,
            round.batch + 1,
            round.floor,
            format_beta(round.beta)
        ));
    }

    fn warning(&mut self, warning: &dyn fmt::Display) {
        self.parent.report_warning(Some(&self.id), warning);
    }

    fn ok(self: Box<Self>, output: &SessionOutput) {
        let verbosity = self.parent.verbosity;
        let mut printer = self.parent.lock_printer();
        let mark = match output.outcome {
            Outcome::Converged => Checkmark::Pass,
            Outcome::Exhausted => Checkmark::Exhausted,
        };
        printer.print_checkbox(mark);
        printer.print(format_args!("{}", self.id));
        if verbosity >= Verbosity::Verbose {
            printer
                .dimmed()
                .print(format_args!(" @ {}", output.channel));
        }
        if let Some(started_at) = self.started_at {
            let latency = started_at.elapsed();
            printer.dimmed().print(format_args!(" ({latency:?})"));
        }
        printer.print_str("\n");

        let floor = output.floor.to_string();
        if verbosity == Verbosity::Quiet {
            printer.print_row("Floor", true, &floor);
            return;
        }
        printer.print_row("Floor", false, &floor);
        printer.print_row("Mean", false, &format!("{:.2}", output.mean()));
        printer.print_row("Trials", false, &output.trials.to_string());
        if verbosity >= Verbosity::Verbose {
            printer.print_row("Rounds", false, &output.rounds.to_string());
        }
        printer.print_row("Rel. error", true, &format_beta(output.beta));
    }

    fn error(self: Box<Self>, error: &dyn fmt::Display) {
        self.parent
            .report_error(Some(&self.id as &dyn fmt::Display), error);
    }
}

impl<W> Reporter for PrintingReporter<W>
where
    W: io::Write + fmt::Debug + Send + 'static,
{
    fn debug(&mut self, info: &dyn fmt::Display) {
        self.report_debug(format_args!("{info}"));
    }

    fn warning(&mut self, warning: &dyn fmt::Display) {
        self.report_warning(None, warning);
    }

    fn new_test(&mut self, name: &str) -> Box<dyn super::TestReporter> {
        Box::new(TestReporter {
            parent: self.clone(),
            name: name.to_owned(),
            started_at: Instant::now(),
        })
    }

    fn new_session(&mut self, id: &SessionId) -> Box<dyn super::SessionReporter> {
        if self.verbosity >= Verbosity::Verbose {
            let mut printer = self.lock_printer();
            printer.print_checkbox(Checkmark::InProgress);
            printer.print(format_args!("{id}: started\n"));
        }

        Box::new(SessionReporter {
            parent: self.clone(),
            id: id.clone(),
            started_at: None,
        })
    }
}
