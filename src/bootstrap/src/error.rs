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

//! Errors returned by the provisioning pipeline.
//!
//! Conditions that the pipeline recovers from, such as a resource that
//! already exists or a denied preferred bucket name, never surface as an
//! [Error]. Every variant here terminates the run.

use std::path::PathBuf;

/// A boxed error, used for sources from the authentication library.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The exit code for a run that completed all stages.
pub const EXIT_SUCCESS: i32 = 0;
/// The exit code for a fatal failure in any provisioning stage.
pub const EXIT_FAILURE: i32 = 1;
/// The exit code for invalid input on the command line or the prompt.
pub const EXIT_USAGE: i32 = 2;

/// A fatal error in one of the provisioning stages.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The project id does not match `^[a-z0-9-]{6,30}$`.
    #[error(
        "invalid project id {0:?}, must be 6-30 characters long, using lowercase letters, numbers, and hyphens"
    )]
    InvalidInput(String),

    /// The input closed before a valid project id was entered.
    #[error("no valid project id entered before the end of input")]
    InputClosed,

    /// The Application Default Credentials are missing or unusable.
    #[error("authentication failed: {0}")]
    AuthenticationRequired(#[source] BoxError),

    /// A client library client could not be initialized.
    #[error("cannot initialize the {service} client: {source}")]
    Client {
        service: &'static str,
        #[source]
        source: google_cloud_gax::client_builder::Error,
    },

    /// Neither the preferred nor the fallback bucket could be created or reused.
    #[error("cannot create or reuse bucket {bucket}: {source}")]
    Bucket {
        bucket: String,
        #[source]
        source: google_cloud_gax::error::Error,
    },

    /// The service account lookup failed, or the account could not be created.
    #[error("cannot look up or create service account {email}: {source}")]
    Identity {
        email: String,
        #[source]
        source: google_cloud_gax::error::Error,
    },

    /// The project IAM policy could not be fetched or written.
    #[error("cannot update the IAM policy for project {project}: {source}")]
    Policy {
        project: String,
        #[source]
        source: google_cloud_gax::error::Error,
    },

    /// The service refused to create a new service account key.
    #[error("cannot create a key for service account {email}: {source}")]
    KeyMint {
        email: String,
        #[source]
        source: google_cloud_gax::error::Error,
    },

    /// The service returned a key without any credential material.
    #[error("the key created for service account {email} has no private key data")]
    EmptyKey { email: String },

    /// The key file could not be written.
    #[error("cannot write the key file {}: {source}", path.display())]
    KeyWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) | Self::InputClosed => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}
