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

//! Runs the provisioning stages in order.
//!
//! The run is strictly linear:
//!
//! ```text
//! START -> VALIDATE -> AUTHENTICATE -> BUCKET -> IDENTITY -> ROLES -> KEY -> DONE
//! ```
//!
//! Validation and authentication happen before a [Provisioner] exists, see
//! [crate::project] and [crate::transport::authenticate]. A fatal error in any
//! stage aborts the remaining stages. Nothing is rolled back.

use crate::bucket::{BucketResult, ensure_state_bucket};
use crate::config::Config;
use crate::console::Console;
use crate::identity::ensure_service_identity;
use crate::key::mint_and_persist_key;
use crate::policy::ensure_role_bindings;
use crate::stub::{Buckets, Policies, ServiceAccounts};
use crate::Error;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// The title printed at the start of a run.
pub const TITLE: &str = "Binge+ GCP Infrastructure Setup";

/// The provisioning stages that need remote calls, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Bucket,
    Identity,
    Roles,
    Key,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bucket => "bucket",
            Self::Identity => "identity",
            Self::Roles => "roles",
            Self::Key => "key",
        };
        f.write_str(name)
    }
}

/// A fatal error and the stage where it happened.
#[derive(Debug, thiserror::Error)]
#[error("provisioning failed in the {stage} stage: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl StageError {
    pub fn exit_code(&self) -> i32 {
        self.source.exit_code()
    }
}

/// The resources provisioned by a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub bucket: BucketResult,
    pub service_account: String,
    /// The roles granted by this run. Roles granted earlier are not listed.
    pub applied_roles: Vec<String>,
    pub key_path: PathBuf,
}

/// Runs the provisioning pipeline for one project.
///
/// # Example
/// ```no_run
/// # use gcp_bootstrap::{config::Config, console::Console, project::ProjectId};
/// # use gcp_bootstrap::provisioner::Provisioner;
/// # use gcp_bootstrap::transport::{Transport, authenticate};
/// # async fn sample() -> anyhow::Result<()> {
/// let config = Config::new(ProjectId::new("binge-plus-1")?);
/// let transport = Transport::new(authenticate().await?).await?;
/// let provisioner = Provisioner::from_transport(config, transport);
/// let report = provisioner.run(&mut Console::stdout()).await?;
/// println!("{report:?}");
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct Provisioner {
    config: Config,
    buckets: Arc<dyn Buckets>,
    accounts: Arc<dyn ServiceAccounts>,
    policies: Arc<dyn Policies>,
}

impl Provisioner {
    pub fn new(
        config: Config,
        buckets: Arc<dyn Buckets>,
        accounts: Arc<dyn ServiceAccounts>,
        policies: Arc<dyn Policies>,
    ) -> Self {
        Self {
            config,
            buckets,
            accounts,
            policies,
        }
    }

    /// Uses a single implementation for all the remote operations.
    pub fn from_transport<T>(config: Config, transport: T) -> Self
    where
        T: Buckets + ServiceAccounts + Policies + 'static,
    {
        let transport = Arc::new(transport);
        Self::new(config, transport.clone(), transport.clone(), transport)
    }

    /// Runs the bucket, identity, roles, and key stages.
    pub async fn run<W: Write>(
        &self,
        console: &mut Console<W>,
    ) -> std::result::Result<Report, StageError> {
        let config = &self.config;
        tracing::info!(
            "provisioning project {} in {} ({})",
            config.project_id(),
            config.region(),
            config.zone()
        );

        let bucket = ensure_state_bucket(self.buckets.as_ref(), &config.bucket_spec(), console)
            .await
            .map_err(at(Stage::Bucket))?;

        let identity = config.service_identity();
        let service_account = ensure_service_identity(self.accounts.as_ref(), &identity, console)
            .await
            .map_err(at(Stage::Identity))?;

        let applied_roles = ensure_role_bindings(
            self.policies.as_ref(),
            config.project_id(),
            &service_account,
            config.roles(),
            console,
        )
        .await
        .map_err(at(Stage::Roles))?;

        let key_path = mint_and_persist_key(
            self.accounts.as_ref(),
            &identity,
            &config.key_path(),
            console,
        )
        .await
        .map_err(at(Stage::Key))?;

        console.success("GCP infrastructure setup completed successfully!");
        Ok(Report {
            bucket,
            service_account,
            applied_roles,
            key_path,
        })
    }
}

fn at(stage: Stage) -> impl FnOnce(Error) -> StageError {
    move |source| {
        tracing::error!("{stage} stage failed: {source}");
        StageError { stage, source }
    }
}
