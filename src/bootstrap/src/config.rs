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

//! The immutable configuration for a provisioning run.

use crate::project::ProjectId;
use std::path::PathBuf;

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_ZONE: &str = "us-central1-a";
pub const DEFAULT_SERVICE_ACCOUNT_ID: &str = "binge-plus-sa";
pub const DEFAULT_DISPLAY_NAME: &str = "Binge Plus Service Account";
pub const DEFAULT_DESCRIPTION: &str = "Service Account for Binge Plus application";
pub const DEFAULT_BUCKET_PREFIX: &str = "binge-plus";

/// The roles granted to the service account, in the order they are applied.
pub const DEFAULT_ROLES: [&str; 13] = [
    "roles/artifactregistry.admin",
    "roles/bigquery.dataViewer",
    "roles/run.viewer",
    "roles/cloudsql.viewer",
    "roles/compute.admin",
    "roles/compute.networkAdmin",
    "roles/compute.storageAdmin",
    "roles/compute.viewer",
    "roles/resourcemanager.projectIamAdmin",
    "roles/pubsub.viewer",
    "roles/iam.serviceAccountAdmin",
    "roles/iam.serviceAccountKeyAdmin",
    "roles/storage.objectAdmin",
];

const BUCKET_SUFFIX: &str = "-tfstate";

/// The configuration for a provisioning run.
///
/// Built once at startup. The `with_*` functions consume the value, so a
/// configuration cannot change once the pipeline holds it.
///
/// # Example
/// ```
/// # use gcp_bootstrap::{config::Config, project::ProjectId};
/// let config = Config::new(ProjectId::new("binge-plus-1")?);
/// assert_eq!(config.bucket_spec().fallback_name, "binge-plus-1-tfstate");
/// assert_eq!(config.key_path().to_str(), Some("binge-plus-sa-key.json"));
/// # Ok::<(), gcp_bootstrap::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    project_id: ProjectId,
    region: String,
    zone: String,
    service_account_id: String,
    display_name: String,
    description: String,
    bucket_prefix: String,
    roles: Vec<String>,
    key_directory: PathBuf,
}

impl Config {
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            region: DEFAULT_REGION.to_string(),
            zone: DEFAULT_ZONE.to_string(),
            service_account_id: DEFAULT_SERVICE_ACCOUNT_ID.to_string(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            bucket_prefix: DEFAULT_BUCKET_PREFIX.to_string(),
            roles: dedup(DEFAULT_ROLES),
            key_directory: PathBuf::new(),
        }
    }

    /// Replaces the role list. Duplicates are removed, keeping the first one.
    pub fn with_roles<I, V>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.roles = dedup(roles);
        self
    }

    pub fn with_service_account_id<V: Into<String>>(mut self, v: V) -> Self {
        self.service_account_id = v.into();
        self
    }

    /// Saves the key file in `v` instead of the working directory.
    pub fn with_key_directory<V: Into<PathBuf>>(mut self, v: V) -> Self {
        self.key_directory = v.into();
        self
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// The file where the service account key is saved.
    pub fn key_path(&self) -> PathBuf {
        self.key_directory
            .join(format!("{}-key.json", self.service_account_id))
    }

    pub fn bucket_spec(&self) -> BucketSpec {
        BucketSpec {
            project_id: self.project_id.clone(),
            preferred_name: format!("{}{BUCKET_SUFFIX}", self.bucket_prefix),
            fallback_name: format!("{}{BUCKET_SUFFIX}", self.project_id),
            location: self.region.clone(),
            versioning_enabled: true,
        }
    }

    pub fn service_identity(&self) -> ServiceIdentity {
        ServiceIdentity {
            project_id: self.project_id.clone(),
            account_id: self.service_account_id.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
        }
    }
}

fn dedup<I, V>(roles: I) -> Vec<String>
where
    I: IntoIterator<Item = V>,
    V: Into<String>,
{
    let mut unique: Vec<String> = Vec::new();
    for role in roles.into_iter().map(Into::into) {
        if !unique.contains(&role) {
            unique.push(role);
        }
    }
    unique
}

/// The Terraform state bucket to create or reuse.
#[derive(Clone, Debug, PartialEq)]
pub struct BucketSpec {
    pub project_id: ProjectId,
    /// The bucket name tried first, shared by every project using this tool.
    pub preferred_name: String,
    /// The bucket name derived from the project id.
    pub fallback_name: String,
    pub location: String,
    pub versioning_enabled: bool,
}

/// A bucket name to try, and whether the run fails if it cannot be used.
#[derive(Clone, Debug, PartialEq)]
pub struct BucketAttempt {
    pub name: String,
    pub must_succeed: bool,
}

impl BucketSpec {
    /// The bucket names to try, in order.
    ///
    /// Only the last attempt must succeed. If both names are the same there
    /// is a single attempt.
    pub fn attempts(&self) -> Vec<BucketAttempt> {
        let mut attempts = Vec::new();
        if self.preferred_name != self.fallback_name {
            attempts.push(BucketAttempt {
                name: self.preferred_name.clone(),
                must_succeed: false,
            });
        }
        attempts.push(BucketAttempt {
            name: self.fallback_name.clone(),
            must_succeed: true,
        });
        attempts
    }
}

/// The service account used by Terraform.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceIdentity {
    pub project_id: ProjectId,
    pub account_id: String,
    pub display_name: String,
    pub description: String,
}

impl ServiceIdentity {
    pub fn email(&self) -> String {
        format!(
            "{}@{}.iam.gserviceaccount.com",
            self.account_id, self.project_id
        )
    }

    /// The resource name used by the IAM API.
    pub fn resource_name(&self) -> String {
        format!("projects/{}/serviceAccounts/{}", self.project_id, self.email())
    }

    /// The IAM policy member for this account.
    pub fn member(&self) -> String {
        member_for(&self.email())
    }
}

/// The IAM policy member for a service account email.
pub fn member_for(email: &str) -> String {
    format!("serviceAccount:{email}")
}
