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

//! Creates or reuses the Terraform state bucket.

use crate::config::BucketSpec;
use crate::console::Console;
use crate::lookup::{Lookup, classify};
use crate::stub::Buckets;
use crate::{Error, Result};
use google_cloud_storage::model::Bucket;
use google_cloud_storage::model::bucket::Versioning;
use std::io::Write;

/// The bucket used to store the Terraform state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketResult {
    pub name: String,
    /// True if this run created the bucket, false if it already existed.
    pub created: bool,
}

/// Ensures a versioned state bucket exists.
///
/// Tries each of [BucketSpec::attempts] in order. An attempt reuses the
/// bucket if it exists, or creates it with versioning enabled. Failures on
/// the preferred name, including permission errors, fall through to the next
/// name. A failure on the last name is fatal.
pub async fn ensure_state_bucket<W: Write>(
    stub: &dyn Buckets,
    spec: &BucketSpec,
    console: &mut Console<W>,
) -> Result<BucketResult> {
    for attempt in spec.attempts() {
        match reuse_or_create(stub, spec, &attempt.name).await {
            Ok(result) => {
                if result.created {
                    console.success(format!(
                        "Terraform state bucket {} created successfully!",
                        result.name
                    ));
                } else {
                    console.warning(format!(
                        "Bucket {} already exists. Skipping creation.",
                        result.name
                    ));
                }
                return Ok(result);
            }
            Err(e) if !attempt.must_succeed => {
                tracing::warn!(
                    "cannot use bucket {} ({:?}): {e}",
                    attempt.name,
                    classify(&e)
                );
                console.warning(format!(
                    "Cannot use bucket {}: {e}. Trying the next name.",
                    attempt.name
                ));
            }
            Err(e) => {
                let error = Error::Bucket {
                    bucket: attempt.name,
                    source: e,
                };
                console.failure(format!("Error creating bucket: {error}"));
                return Err(error);
            }
        }
    }
    unreachable!("the last bucket attempt always has `must_succeed` set");
}

async fn reuse_or_create(
    stub: &dyn Buckets,
    spec: &BucketSpec,
    name: &str,
) -> google_cloud_gax::Result<BucketResult> {
    match Lookup::from(stub.get_bucket(name.to_string()).await) {
        Lookup::Found(_) => {
            tracing::info!("reusing existing bucket {name}");
            Ok(BucketResult {
                name: name.to_string(),
                created: false,
            })
        }
        Lookup::NotFound => {
            let bucket = stub.create_bucket(name.to_string(), new_bucket(spec)).await?;
            tracing::info!("created bucket {name}: {bucket:?}");
            Ok(BucketResult {
                name: name.to_string(),
                created: true,
            })
        }
        Lookup::Error(e) => Err(e),
    }
}

/// The metadata for a newly created state bucket.
fn new_bucket(spec: &BucketSpec) -> Bucket {
    Bucket::new()
        .set_project(spec.project_id.resource_name())
        .set_location(spec.location.to_uppercase())
        .set_versioning(Versioning::new().set_enabled(spec.versioning_enabled))
}
