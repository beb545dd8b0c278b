use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Step spinner on stderr. Cleared when dropped, whichever way the caller
/// exits.
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn start(enabled: bool) -> Self {
        if !enabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    pub fn set_message(&self, message: &'static str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message);
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

pub fn print_success(message: &str) {
    println!("{}", style(message).green());
}

pub fn print_warning(message: &str) {
    println!("{}", style(message).yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{}", style(message).red());
}

pub fn print_reopen_terminal() {
    println!("Please open a new terminal session to pick up the PATH changes.");
}

/// Asks `question` until the answer is exactly `y` or `n`. End of input
/// counts as `n`.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<bool> {
    loop {
        write!(output, "{} [y/n]: ", question)?;
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        match answer.trim_end_matches(['\r', '\n']) {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => writeln!(output, "Please answer \"y\" or \"n\".")?,
        }
    }
}
