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

//! Project id validation and the interactive prompt.

use crate::console::Console;
use crate::{Error, Result};
use regex::Regex;
use std::io::{BufRead, Write};
use std::sync::LazyLock;

const PROJECT_ID_PATTERN: &str = r"^[a-z0-9-]{6,30}$";

static PROJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PROJECT_ID_PATTERN).expect("project id pattern is valid"));

/// The prompt printed when the project id is read interactively.
pub const PROMPT: &str = "Enter your GCP Project ID: ";

/// A validated Google Cloud project id.
///
/// The value always matches `^[a-z0-9-]{6,30}$`. It cannot be changed after
/// validation.
///
/// # Example
/// ```
/// # use gcp_bootstrap::project::ProjectId;
/// let id = ProjectId::new("binge-plus-1")?;
/// assert_eq!(id.as_str(), "binge-plus-1");
/// assert!(ProjectId::new("abc").is_err());
/// # Ok::<(), gcp_bootstrap::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    /// Validates `value` and returns it unchanged on success.
    pub fn new<T: Into<String>>(value: T) -> Result<Self> {
        let value = value.into();
        if PROJECT_ID.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidInput(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The resource name used by the Resource Manager and IAM APIs.
    pub fn resource_name(&self) -> String {
        format!("projects/{}", self.0)
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ProjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reads project ids from `input` until one is valid.
///
/// Each invalid line is reported on `console` and the prompt is repeated.
/// This is the only retry loop in the pipeline. Returns
/// [Error::InputClosed] if `input` ends before a valid id is read.
pub fn prompt_project_id<R, W>(input: &mut R, console: &mut Console<W>) -> Result<ProjectId>
where
    R: BufRead,
    W: Write,
{
    loop {
        console.prompt(PROMPT);
        let mut line = String::new();
        let count = input.read_line(&mut line).map_err(|e| {
            tracing::warn!("cannot read the project id: {e}");
            Error::InputClosed
        })?;
        if count == 0 {
            return Err(Error::InputClosed);
        }
        match ProjectId::new(line.trim()) {
            Ok(id) => return Ok(id),
            Err(e) => {
                tracing::debug!("rejected project id: {e}");
                console.failure(e);
            }
        }
    }
}
