use std::io::{BufRead, Write};
use std::path::PathBuf;

use log::warn;

use crate::data::filter::MwRange;
use crate::error::{ErrorKind, ProteoError, Result};

// ---------------------------------------------------------------------------
// Molecular-weight ranges
// ---------------------------------------------------------------------------

/// Parse `"MIN MAX"` or `"MIN,MAX"` (Dalton) into a validated range.
pub fn parse_range(input: &str) -> Result<MwRange> {
    let parts: Vec<&str> = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .collect();
    let [min, max] = parts.as_slice() else {
        return Err(ProteoError::InvalidRange(format!(
            "expected two numbers 'minimum maximum', got '{}'",
            input.trim()
        )));
    };
    let number = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| ProteoError::InvalidRange(format!("'{s}' is not a number")))
    };
    MwRange::new(number(*min)?, number(*max)?)
}

/// Source of MW ranges for bands the command line did not cover.
pub trait RangePrompt {
    /// Ask for the range of the band loaded from `file_name`. Returns only a
    /// valid range; malformed answers are asked again.
    fn ask_range(&mut self, label: &str, file_name: &str) -> Result<MwRange>;
}

/// Asks on a terminal (or any reader / writer pair) until the answer parses.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TerminalPrompt { input, output }
    }
}

impl TerminalPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        TerminalPrompt::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> RangePrompt for TerminalPrompt<R, W> {
    fn ask_range(&mut self, label: &str, file_name: &str) -> Result<MwRange> {
        loop {
            write!(
                self.output,
                "{label} ({file_name}): molecular-weight cut-offs IN DALTON, \
                 'minimum maximum': "
            )
            .and_then(|_| self.output.flush())
            .map_err(|e| ProteoError::io("writing prompt", e))?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|e| ProteoError::io("reading range", e))?;
            if read == 0 {
                return Err(ProteoError::io(
                    format!("no molecular-weight range given for {label}"),
                    std::io::ErrorKind::UnexpectedEof.into(),
                ));
            }

            match parse_range(&line) {
                Ok(range) => return Ok(range),
                Err(e) if e.kind() == ErrorKind::InputValidation => {
                    warn!("{label}: {e}");
                    writeln!(self.output, "Not good! {e}")
                        .map_err(|e| ProteoError::io("writing prompt", e))?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// File selection
// ---------------------------------------------------------------------------

/// Every extension `load_table` reads.
const TABLE_EXTENSIONS: &[&str] = &[
    "xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "json", "parquet", "pq",
];

/// Native open-file dialog. `None` when the operator cancels.
pub fn pick_table(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Protein tables", TABLE_EXTENSIONS)
        .pick_file()
}

/// Native yes / no dialog.
pub fn confirm(title: &str, question: &str) -> bool {
    let answer = rfd::MessageDialog::new()
        .set_title(title)
        .set_description(question)
        .set_buttons(rfd::MessageButtons::YesNo)
        .show();
    matches!(answer, rfd::MessageDialogResult::Yes)
}
