//! Styled terminal output and interactive prompts.
//!
//! Severity lines are colored in normal mode and suppressed in verbose mode,
//! where tracing output takes over. Errors and prompts are always shown.

use crate::resolver::{Choice, Disambiguation, Prompter};
use colored::Colorize;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::{Mutex, PoisonError};

/// Console configuration
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub colors_enabled: bool,
    pub verbose: bool,
}

impl ConsoleConfig {
    /// Create console config from environment and args
    pub fn new(verbose: bool) -> Self {
        Self {
            colors_enabled: should_use_colors(),
            verbose,
        }
    }
}

/// Check if we should use colors in output
fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    io::stderr().is_terminal()
}

/// Shared output sink with separate locks for log lines and prompts
///
/// A prompt holds the prompt lock and then the log lock for the whole
/// question and answer, so log lines from other threads never land inside it.
pub struct Console {
    config: ConsoleConfig,
    log: Mutex<Box<dyn Write + Send>>,
    prompt: Mutex<Box<dyn BufRead + Send>>,
}

impl Console {
    /// Console writing to stderr and reading answers from stdin
    pub fn new(config: ConsoleConfig) -> Self {
        Self::with_io(
            config,
            Box::new(io::stderr()),
            Box::new(io::BufReader::new(io::stdin())),
        )
    }

    /// Console over custom streams (for testing)
    pub fn with_io(
        config: ConsoleConfig,
        writer: Box<dyn Write + Send>,
        reader: Box<dyn BufRead + Send>,
    ) -> Self {
        if !config.colors_enabled {
            colored::control::set_override(false);
        }

        Self {
            config,
            log: Mutex::new(writer),
            prompt: Mutex::new(reader),
        }
    }

    fn line(&self, text: &str) {
        let mut writer = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{}", text);
    }

    /// Print an info message
    pub fn info(&self, msg: &str) {
        if self.config.verbose {
            return;
        }
        if self.config.colors_enabled {
            self.line(&msg.cyan().to_string());
        } else {
            self.line(msg);
        }
    }

    /// Print a warning message
    pub fn warning(&self, msg: &str) {
        if self.config.verbose {
            return;
        }
        if self.config.colors_enabled {
            self.line(&format!("{} {}", "!".yellow().bold(), msg.yellow()));
        } else {
            self.line(&format!("! {}", msg));
        }
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        // Errors shown in both modes
        if self.config.colors_enabled {
            self.line(&format!("{} {}", "✗".red().bold(), msg.red()));
        } else {
            self.line(&format!("X {}", msg));
        }
    }

    /// Print a created link: from → to
    pub fn linked(&self, from: &str, to: &str) {
        if self.config.verbose {
            return;
        }
        if self.config.colors_enabled {
            self.line(&format!(
                "  {} {} {} {}",
                "✓".green(),
                from.dimmed(),
                "→".green(),
                to
            ));
        } else {
            self.line(&format!("  * {} -> {}", from, to));
        }
    }

    /// Ask a question and read one line of answer
    ///
    /// Returns `None` on end of input or a read error.
    pub fn ask(&self, question: &str) -> Option<String> {
        let mut reader = self.prompt.lock().unwrap_or_else(PoisonError::into_inner);
        let mut writer = self.log.lock().unwrap_or_else(PoisonError::into_inner);

        let _ = write!(writer, "{}", question);
        let _ = writer.flush();

        let mut answer = String::new();
        match reader.read_line(&mut answer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(answer.trim().to_string()),
        }
    }
}

fn menu(question: &Disambiguation) -> String {
    let mut text = format!(
        "\nMultiple {} matches for \"{}\":\n",
        question.kind.as_path(),
        question.query
    );

    for (i, candidate) in question.candidates.iter().enumerate() {
        let year = candidate
            .release_year
            .map(|y| format!(" ({})", y))
            .unwrap_or_default();
        text.push_str(&format!(
            "  {}) {}{} {{{}}}\n",
            i + 1,
            candidate.name,
            year,
            candidate.id
        ));
    }

    text.push_str(&format!(
        "Choose 1-{} or type an id [default 1]: ",
        question.candidates.len()
    ));
    text
}

impl Prompter for Console {
    fn choose(&self, question: &Disambiguation) -> Choice {
        match self.ask(&menu(question)) {
            Some(answer) => Choice::parse(&answer, question.candidates.len()),
            None => Choice::Default,
        }
    }

    fn season_for(&self, show: &str) -> Option<u32> {
        let answer = self.ask(&format!("Season number for \"{}\" [default 1]: ", show))?;
        answer.parse().ok()
    }
}
