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

//! The remote operations used by the provisioning stages.
//!
//! The production implementations in [crate::transport] call the Google Cloud
//! client libraries. Tests implement these traits with mocks or in-memory
//! fakes.

use google_cloud_gax::Result;
use google_cloud_iam_admin_v1::model::{ServiceAccount, ServiceAccountKey};
use google_cloud_iam_v1::model::Policy;
use google_cloud_storage::model::Bucket;

/// Cloud Storage bucket operations.
#[async_trait::async_trait]
pub trait Buckets: std::fmt::Debug + Send + Sync {
    /// Gets the bucket metadata, `bucket_id` is the short bucket name.
    async fn get_bucket(&self, bucket_id: String) -> Result<Bucket>;

    /// Creates the bucket `bucket_id` with the given metadata.
    async fn create_bucket(&self, bucket_id: String, bucket: Bucket) -> Result<Bucket>;
}

/// IAM service account operations.
#[async_trait::async_trait]
pub trait ServiceAccounts: std::fmt::Debug + Send + Sync {
    /// Gets a service account by resource name.
    ///
    /// The name has the form `projects/{project}/serviceAccounts/{email}`.
    async fn get_service_account(&self, name: String) -> Result<ServiceAccount>;

    /// Creates a service account in `project`, which has the form
    /// `projects/{project}`.
    async fn create_service_account(
        &self,
        project: String,
        account_id: String,
        account: ServiceAccount,
    ) -> Result<ServiceAccount>;

    /// Creates a key in the Google credentials file format.
    async fn create_service_account_key(&self, name: String) -> Result<ServiceAccountKey>;
}

/// Project IAM policy operations.
#[async_trait::async_trait]
pub trait Policies: std::fmt::Debug + Send + Sync {
    /// Gets the IAM policy for `resource`, which has the form `projects/{project}`.
    ///
    /// `requested_version` is the policy format version to return.
    async fn get_iam_policy(&self, resource: String, requested_version: i32) -> Result<Policy>;

    /// Replaces the IAM policy for `resource`.
    async fn set_iam_policy(&self, resource: String, policy: Policy) -> Result<Policy>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    mockall::mock! {
        #[derive(Debug)]
        pub(crate) Buckets {}
        #[async_trait::async_trait]
        impl Buckets for Buckets {
            async fn get_bucket(&self, bucket_id: String) -> Result<Bucket>;
            async fn create_bucket(&self, bucket_id: String, bucket: Bucket) -> Result<Bucket>;
        }
    }

    mockall::mock! {
        #[derive(Debug)]
        pub(crate) ServiceAccounts {}
        #[async_trait::async_trait]
        impl ServiceAccounts for ServiceAccounts {
            async fn get_service_account(&self, name: String) -> Result<ServiceAccount>;
            async fn create_service_account(
                &self,
                project: String,
                account_id: String,
                account: ServiceAccount,
            ) -> Result<ServiceAccount>;
            async fn create_service_account_key(&self, name: String) -> Result<ServiceAccountKey>;
        }
    }

    mockall::mock! {
        #[derive(Debug)]
        pub(crate) Policies {}
        #[async_trait::async_trait]
        impl Policies for Policies {
            async fn get_iam_policy(&self, resource: String, requested_version: i32) -> Result<Policy>;
            async fn set_iam_policy(&self, resource: String, policy: Policy) -> Result<Policy>;
        }
    }
}
