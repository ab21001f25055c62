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

//! Explicit outcomes for "look up, then create" operations.

use google_cloud_gax::error::Error;
use google_cloud_gax::error::rpc::Code;

/// The outcome of looking up a resource by name.
///
/// A missing resource is an expected outcome when provisioning, and callers
/// branch on it instead of inspecting errors.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Error(Error),
}

impl<T> From<google_cloud_gax::Result<T>> for Lookup<T> {
    fn from(value: google_cloud_gax::Result<T>) -> Self {
        match value {
            Ok(v) => Self::Found(v),
            Err(e) if classify(&e) == ErrorClass::NotFound => Self::NotFound,
            Err(e) => Self::Error(e),
        }
    }
}

/// The error conditions the provisioning stages react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    PermissionDenied,
    AlreadyExists,
    Other,
}

/// Classifies a client library error.
///
/// Prefers the status code reported by the service. Errors without a
/// recognized status fall back to the HTTP status code.
pub fn classify(error: &Error) -> ErrorClass {
    if let Some(status) = error.status() {
        match status.code {
            Code::NotFound => return ErrorClass::NotFound,
            Code::PermissionDenied => return ErrorClass::PermissionDenied,
            Code::AlreadyExists => return ErrorClass::AlreadyExists,
            _ => {}
        }
    }
    match error.http_status_code() {
        Some(404) => ErrorClass::NotFound,
        Some(403) => ErrorClass::PermissionDenied,
        Some(409) => ErrorClass::AlreadyExists,
        _ => ErrorClass::Other,
    }
}
