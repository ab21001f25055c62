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

use clap::Parser;
use gcp_bootstrap::project::ProjectId;

/// Command-line options.
#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = super::DESCRIPTION)]
pub struct Args {
    /// The Google Cloud project to provision.
    ///
    /// Must be 6-30 characters long, using lowercase letters, numbers, and
    /// hyphens. If not set, the project id is read from the terminal.
    #[arg(long)]
    pub project_id: Option<ProjectId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn project_id() -> anyhow::Result<()> {
        let args = Args::try_parse_from(["program", "--project-id=binge-plus-1"])?;
        assert_eq!(
            args.project_id.as_ref().map(ProjectId::as_str),
            Some("binge-plus-1")
        );
        Ok(())
    }

    #[test]
    fn no_project_id() -> anyhow::Result<()> {
        let args = Args::try_parse_from(["program"])?;
        assert!(args.project_id.is_none(), "{args:?}");
        Ok(())
    }

    #[test_case(&["program", "--project-id=abc"])]
    #[test_case(&["program", "--project-id=Binge-Plus"])]
    #[test_case(&["program", "--project-id"])]
    #[test_case(&["program", "--zone=us-east1-b"])]
    fn invalid(input: &[&str]) {
        let got = Args::try_parse_from(input);
        assert!(got.is_err(), "{got:?}");
    }
}
