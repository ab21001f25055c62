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

//! Bootstrap a Google Cloud project for Terraform-managed infrastructure.
//!
//! This crate provisions the resources a Terraform deployment needs before
//! Terraform itself can run:
//!
//! * a versioned Cloud Storage bucket to hold the Terraform state,
//! * a service account used by Terraform,
//! * a fixed set of project-level IAM roles granted to that service account,
//! * a key for the service account, saved to a local JSON file.
//!
//! Every step checks the current state of the project before changing it, so
//! running the pipeline again against a provisioned project creates no
//! duplicate resources. The only exception is the key: each run mints a new
//! key and overwrites the local key file.
//!
//! The pipeline is driven by [Provisioner][provisioner::Provisioner]. The
//! remote calls go through the traits in [stub], which are implemented by the
//! Google Cloud client libraries in [transport] and by mocks in tests.

pub mod bucket;
pub mod config;
pub mod console;
pub mod error;
pub mod identity;
pub mod key;
pub mod lookup;
pub mod policy;
pub mod project;
pub mod provisioner;
pub mod stub;
pub mod transport;

pub use error::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
