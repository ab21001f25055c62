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

//! Creates or reuses the service account.

use crate::config::ServiceIdentity;
use crate::console::Console;
use crate::lookup::{ErrorClass, Lookup, classify};
use crate::stub::ServiceAccounts;
use crate::{Error, Result};
use google_cloud_iam_admin_v1::model::ServiceAccount;
use std::io::Write;

/// Ensures the service account exists and returns its email.
///
/// The account is looked up before it is created. Any lookup error other
/// than "not found" is fatal. A create that fails because the account
/// already exists reuses it, since account ids are unique in a project. Any
/// other creation error is fatal.
pub async fn ensure_service_identity<W: Write>(
    stub: &dyn ServiceAccounts,
    identity: &ServiceIdentity,
    console: &mut Console<W>,
) -> Result<String> {
    let email = identity.email();
    let result = match Lookup::from(stub.get_service_account(identity.resource_name()).await) {
        Lookup::Found(account) => {
            tracing::info!("found service account {email}: {account:?}");
            console.warning(format!("Service account {email} already exists."));
            Ok(email)
        }
        Lookup::NotFound => create(stub, identity, email, console).await,
        Lookup::Error(source) => Err(Error::Identity { email, source }),
    };
    if let Err(e) = &result {
        console.failure(format!("Error creating service account: {e}"));
    }
    result
}

async fn create<W: Write>(
    stub: &dyn ServiceAccounts,
    identity: &ServiceIdentity,
    email: String,
    console: &mut Console<W>,
) -> Result<String> {
    let account = ServiceAccount::new()
        .set_display_name(&identity.display_name)
        .set_description(&identity.description);
    let created = match stub
        .create_service_account(
            identity.project_id.resource_name(),
            identity.account_id.clone(),
            account,
        )
        .await
    {
        Ok(a) => a,
        Err(e) if classify(&e) == ErrorClass::AlreadyExists => {
            tracing::info!("service account {email} created concurrently: {e}");
            console.warning(format!("Service account {email} already exists."));
            return Ok(email);
        }
        Err(source) => return Err(Error::Identity { email, source }),
    };
    let email = if created.email.is_empty() {
        email
    } else {
        created.email
    };
    tracing::info!("created service account {email}");
    console.success(format!("Service account {email} created successfully!"));
    Ok(email)
}
