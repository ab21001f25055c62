// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Human-readable progress lines for the operator.
//!
//! The console output is not a machine-readable protocol. Diagnostics go
//! through `tracing` and are written to stderr.

use std::fmt::Display;
use std::io::Write;

pub const SUCCESS: &str = "✅";
pub const WARNING: &str = "⚠️";
pub const FAILURE: &str = "❌";
pub const START: &str = "🚀";

/// Writes status lines prefixed with a glyph.
///
/// Write errors are ignored.
#[derive(Debug)]
pub struct Console<W> {
    out: W,
}

impl Console<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn success<T: Display>(&mut self, message: T) {
        self.line(SUCCESS, message);
    }

    pub fn warning<T: Display>(&mut self, message: T) {
        self.line(WARNING, message);
    }

    pub fn failure<T: Display>(&mut self, message: T) {
        self.line(FAILURE, message);
    }

    /// Prints the title of the run, underlined.
    pub fn banner<T: Display>(&mut self, title: T) {
        let title = format!("{START} {title}");
        let _ = writeln!(self.out, "{title}");
        let _ = writeln!(self.out, "{}", "-".repeat(title.chars().count()));
    }

    /// Prints `text` without a newline, for interactive input.
    pub fn prompt(&mut self, text: &str) {
        let _ = write!(self.out, "{text}");
        let _ = self.out.flush();
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line<T: Display>(&mut self, glyph: &str, message: T) {
        let _ = writeln!(self.out, "{glyph} {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lines() -> anyhow::Result<()> {
        let mut console = Console::new(Vec::new());
        console.success("created");
        console.warning("exists");
        console.failure("broken");
        let got = String::from_utf8(console.into_inner())?;
        assert_eq!(got, "✅ created\n⚠️ exists\n❌ broken\n");
        Ok(())
    }

    #[test]
    fn banner() -> anyhow::Result<()> {
        let mut console = Console::new(Vec::new());
        console.banner("Setup");
        let got = String::from_utf8(console.into_inner())?;
        assert_eq!(got, "🚀 Setup\n-------\n");
        Ok(())
    }

    #[test]
    fn prompt_has_no_newline() -> anyhow::Result<()> {
        let mut console = Console::new(Vec::new());
        console.prompt("id: ");
        let got = String::from_utf8(console.into_inner())?;
        assert_eq!(got, "id: ");
        Ok(())
    }
}
