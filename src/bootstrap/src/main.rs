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

//! Bootstrap a Google Cloud project for Terraform.

mod args;

use args::Args;
use clap::Parser;
use gcp_bootstrap::config::Config;
use gcp_bootstrap::console::Console;
use gcp_bootstrap::error::{EXIT_FAILURE, EXIT_SUCCESS};
use gcp_bootstrap::project::{ProjectId, prompt_project_id};
use gcp_bootstrap::provisioner::{Provisioner, TITLE};
use gcp_bootstrap::transport::{Transport, authenticate};
use google_cloud_auth::credentials::Credentials;
use std::io::Write;
use std::process::ExitCode;

const DESCRIPTION: &str = concat!(
    "Prepares a Google Cloud project for Terraform.",
    " Creates (or reuses) a versioned bucket for the Terraform state,",
    " creates a service account, grants it a fixed set of project roles,",
    " and saves a new key for the service account to a local JSON file.",
    " Running the command again creates no duplicate resources,",
    " but always mints a new key and overwrites the key file.",
    " Uses the Application Default Credentials.",
);

const LOGIN_HINT: &str =
    "Authentication failed. Please run 'gcloud auth application-default login'";

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    enable_tracing();
    tracing::debug!("Configuration: {args:?}");

    let mut console = Console::stdout();
    let code = run(args, &mut console, authenticate()).await;
    exit_code(code)
}

/// Runs the pipeline, `credentials` resolves to the authenticated credentials.
async fn run<W, C>(args: Args, console: &mut Console<W>, credentials: C) -> i32
where
    W: Write,
    C: Future<Output = gcp_bootstrap::Result<Credentials>>,
{
    let project_id = match project_id(args, console) {
        Ok(id) => id,
        Err(e) => {
            console.failure(&e);
            return e.exit_code();
        }
    };
    let config = Config::new(project_id);

    console.banner(TITLE);
    let credentials = match credentials.await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{e}");
            console.failure(format!("{LOGIN_HINT}: {e}"));
            return e.exit_code();
        }
    };
    console.success("Authentication successful!");

    let transport = match Transport::new(credentials).await {
        Ok(t) => t,
        Err(e) => {
            console.failure(&e);
            return EXIT_FAILURE;
        }
    };
    match Provisioner::from_transport(config, transport)
        .run(console)
        .await
    {
        Ok(report) => {
            tracing::info!("DONE: {report:?}");
            EXIT_SUCCESS
        }
        Err(e) => e.exit_code(),
    }
}

fn project_id<W: Write>(args: Args, console: &mut Console<W>) -> gcp_bootstrap::Result<ProjectId> {
    if let Some(id) = args.project_id {
        return Ok(id);
    }
    let stdin = std::io::stdin();
    prompt_project_id(&mut stdin.lock(), console)
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn enable_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_level(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
