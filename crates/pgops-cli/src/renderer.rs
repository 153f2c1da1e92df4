//! Terminal rendering for operation results
//!
//! Outcomes are formatted as short markdown by their `Display`
//! implementations. The renderer prints that markdown with termimad styling,
//! as plain text under `--no-color`, or switches to JSON under `--json`.

use anyhow::Result;
use serde_json::Value;
use termimad::{crossterm::style::Color, MadSkin};

/// How results are written to standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Rich,
    Plain,
    Json,
}

impl OutputMode {
    pub fn from_flags(no_color: bool, json: bool) -> Self {
        match (json, no_color) {
            (true, _) => OutputMode::Json,
            (false, true) => OutputMode::Plain,
            (false, false) => OutputMode::Rich,
        }
    }
}

/// Terminal renderer that can switch between rich, plain and JSON output
pub struct TerminalRenderer {
    mode: OutputMode,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(mode: OutputMode) -> Self {
        let mut skin = MadSkin::default();

        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.code_block.set_bg(Color::AnsiValue(238));
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { mode, skin }
    }

    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Render markdown text to the terminal.
    pub fn render(&self, markdown: &str) -> Result<()> {
        match self.mode {
            OutputMode::Rich => {
                for line in markdown.lines() {
                    if line.starts_with('#') {
                        println!("\x1b[34m{line}\x1b[0m");
                    } else {
                        self.skin.print_inline(line);
                        println!();
                    }
                }
            }
            OutputMode::Plain | OutputMode::Json => println!("{}", markdown.trim_end()),
        }
        Ok(())
    }

    /// Print tool output verbatim; markdown styling would mangle table
    /// borders.
    pub fn raw(&self, text: &str) {
        println!("{}", text.trim_end());
    }

    /// Print a JSON document.
    pub fn json(&self, value: &Value) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(OutputMode::Rich)
    }
}
