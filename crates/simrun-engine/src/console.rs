//! User-facing progress output with scoped indentation.
//!
//! A [`Console`] is an explicit value handed to the orchestrator. Each
//! nesting level calls [`Console::scope`]; the returned guard restores the
//! previous indentation when dropped, on success and on early return alike.

use std::cell::{Cell, RefCell};
use std::io::Write;

const INDENT: &str = "  ";

enum Sink {
    Stdout,
    Capture(Vec<String>),
}

/// Indentation-aware line printer.
pub struct Console {
    depth: Cell<usize>,
    sink: RefCell<Sink>,
}

impl Console {
    /// Console printing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            depth: Cell::new(0),
            sink: RefCell::new(Sink::Stdout),
        }
    }

    /// Console recording lines in memory, for tests and embedding.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            depth: Cell::new(0),
            sink: RefCell::new(Sink::Capture(Vec::new())),
        }
    }

    /// Print a (possibly multi-line) message at the current indentation.
    pub fn print(&self, message: impl AsRef<str>) {
        let prefix = INDENT.repeat(self.depth.get());
        let mut sink = self.sink.borrow_mut();
        for line in message.as_ref().lines() {
            let rendered = format!("{prefix}{line}");
            match &mut *sink {
                Sink::Stdout => {
                    let mut out = std::io::stdout().lock();
                    // Progress output is best effort; a closed pipe must not fail the run.
                    let _ = writeln!(out, "{rendered}");
                }
                Sink::Capture(lines) => lines.push(rendered),
            }
        }
    }

    /// Enter one indentation level until the guard is dropped.
    #[must_use = "the scope ends as soon as the guard is dropped"]
    pub fn scope(&self) -> ScopeGuard<'_> {
        self.depth.set(self.depth.get() + 1);
        ScopeGuard { console: self }
    }

    /// Current indentation depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Lines recorded by a capturing console (empty for stdout).
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        match &*self.sink.borrow() {
            Sink::Stdout => Vec::new(),
            Sink::Capture(lines) => lines.clone(),
        }
    }
}

/// Releases one indentation level on drop.
pub struct ScopeGuard<'a> {
    console: &'a Console,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        let depth = self.console.depth.get();
        self.console.depth.set(depth.saturating_sub(1));
    }
}
