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

//! Implements [crate::stub] using the Google Cloud client libraries.

use crate::Error;
use crate::stub;
use google_cloud_auth::credentials::{Builder as CredentialsBuilder, Credentials};
use google_cloud_gax::Result;
use google_cloud_iam_admin_v1::client::Iam;
use google_cloud_iam_admin_v1::model::{
    ServiceAccount, ServiceAccountKey, ServiceAccountPrivateKeyType,
};
use google_cloud_iam_v1::model::{GetPolicyOptions, Policy};
use google_cloud_resourcemanager_v3::client::Projects;
use google_cloud_storage::client::StorageControl;
use google_cloud_storage::model::Bucket;
use http::Extensions;

/// Loads the Application Default Credentials and verifies they are usable.
///
/// Building the credentials succeeds even when nothing is configured, because
/// the default credentials fall back to the metadata service. Fetching the
/// authentication headers once confirms the credentials can authorize calls.
pub async fn authenticate() -> crate::Result<Credentials> {
    let credentials = CredentialsBuilder::default().build().map_err(|e| {
        tracing::debug!("cannot build default credentials: {e:?}");
        Error::AuthenticationRequired(e.into())
    })?;
    credentials
        .headers(Extensions::new())
        .await
        .map_err(|e| {
            tracing::debug!("cannot fetch authentication headers: {e:?}");
            Error::AuthenticationRequired(e.into())
        })?;
    Ok(credentials)
}

/// The client library clients used by the provisioning stages.
#[derive(Clone, Debug)]
pub struct Transport {
    storage: StorageControl,
    iam: Iam,
    projects: Projects,
}

impl Transport {
    /// Creates the clients, all sharing `credentials`.
    pub async fn new(credentials: Credentials) -> crate::Result<Self> {
        let storage = StorageControl::builder()
            .with_credentials(credentials.clone())
            .build()
            .await
            .map_err(|source| Error::Client {
                service: "Cloud Storage",
                source,
            })?;
        let iam = Iam::builder()
            .with_credentials(credentials.clone())
            .build()
            .await
            .map_err(|source| Error::Client {
                service: "IAM",
                source,
            })?;
        let projects = Projects::builder()
            .with_credentials(credentials)
            .build()
            .await
            .map_err(|source| Error::Client {
                service: "Resource Manager",
                source,
            })?;
        Ok(Self {
            storage,
            iam,
            projects,
        })
    }
}

#[async_trait::async_trait]
impl stub::Buckets for Transport {
    async fn get_bucket(&self, bucket_id: String) -> Result<Bucket> {
        tracing::debug!("get_bucket({bucket_id})");
        self.storage
            .get_bucket()
            .set_name(format!("projects/_/buckets/{bucket_id}"))
            .send()
            .await
    }

    async fn create_bucket(&self, bucket_id: String, bucket: Bucket) -> Result<Bucket> {
        tracing::debug!("create_bucket({bucket_id}, {bucket:?})");
        self.storage
            .create_bucket()
            .set_parent("projects/_")
            .set_bucket_id(bucket_id)
            .set_bucket(bucket)
            .send()
            .await
    }
}

#[async_trait::async_trait]
impl stub::ServiceAccounts for Transport {
    async fn get_service_account(&self, name: String) -> Result<ServiceAccount> {
        tracing::debug!("get_service_account({name})");
        self.iam.get_service_account().set_name(name).send().await
    }

    async fn create_service_account(
        &self,
        project: String,
        account_id: String,
        account: ServiceAccount,
    ) -> Result<ServiceAccount> {
        tracing::debug!("create_service_account({project}, {account_id})");
        self.iam
            .create_service_account()
            .set_name(project)
            .set_account_id(account_id)
            .set_service_account(account)
            .send()
            .await
    }

    async fn create_service_account_key(&self, name: String) -> Result<ServiceAccountKey> {
        tracing::debug!("create_service_account_key({name})");
        self.iam
            .create_service_account_key()
            .set_name(name)
            .set_private_key_type(ServiceAccountPrivateKeyType::TypeGoogleCredentialsFile)
            .send()
            .await
    }
}

#[async_trait::async_trait]
impl stub::Policies for Transport {
    async fn get_iam_policy(&self, resource: String, requested_version: i32) -> Result<Policy> {
        tracing::debug!("get_iam_policy({resource}, version={requested_version})");
        self.projects
            .get_iam_policy()
            .set_resource(resource)
            .set_options(GetPolicyOptions::new().set_requested_policy_version(requested_version))
            .send()
            .await
    }

    async fn set_iam_policy(&self, resource: String, policy: Policy) -> Result<Policy> {
        tracing::debug!(
            "set_iam_policy({resource}) with {} bindings",
            policy.bindings.len()
        );
        self.projects
            .set_iam_policy()
            .set_resource(resource)
            .set_policy(policy)
            .send()
            .await
    }
}
