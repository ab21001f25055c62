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

//! Mints a service account key and saves it locally.
//!
//! Unlike the other stages this one has no existence check: every run creates
//! a new key and overwrites the key file.

use crate::config::ServiceIdentity;
use crate::console::Console;
use crate::stub::ServiceAccounts;
use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Creates a new key for `identity` and writes it to `path`.
///
/// The key is in the Google credentials file format. Any existing file at
/// `path` is replaced. On Unix a new file is only readable by its owner.
pub async fn mint_and_persist_key<W: Write>(
    stub: &dyn ServiceAccounts,
    identity: &ServiceIdentity,
    path: &Path,
    console: &mut Console<W>,
) -> Result<PathBuf> {
    let result = mint_and_persist(stub, identity, path).await;
    match &result {
        Ok(path) => console.success(format!(
            "Service account key saved to {}",
            path.display()
        )),
        Err(e) => console.failure(format!("Error creating service account key: {e}")),
    }
    result
}

async fn mint_and_persist(
    stub: &dyn ServiceAccounts,
    identity: &ServiceIdentity,
    path: &Path,
) -> Result<PathBuf> {
    let email = identity.email();
    let key = stub
        .create_service_account_key(identity.resource_name())
        .await
        .map_err(|source| Error::KeyMint {
            email: email.clone(),
            source,
        })?;
    if key.private_key_data.is_empty() {
        return Err(Error::EmptyKey { email });
    }
    tracing::info!("created key {} for {email}", key.name);
    write_key_file(path, &key.private_key_data)
        .await
        .map_err(|source| Error::KeyWrite {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(path.to_path_buf())
}

async fn write_key_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::lookup::tests::status_error;
    use crate::project::ProjectId;
    use crate::stub::tests::MockServiceAccounts;
    use google_cloud_gax::error::rpc::Code;
    use google_cloud_iam_admin_v1::model::ServiceAccountKey;
    use mockall::predicate::eq;

    const NAME: &str =
        "projects/binge-plus-1/serviceAccounts/binge-plus-sa@binge-plus-1.iam.gserviceaccount.com";
    const KEY_DATA: &[u8] = br#"{"type": "service_account", "project_id": "binge-plus-1"}"#;

    fn identity() -> anyhow::Result<ServiceIdentity> {
        Ok(Config::new(ProjectId::new("binge-plus-1")?).service_identity())
    }

    fn key(data: &'static [u8]) -> ServiceAccountKey {
        ServiceAccountKey::new()
            .set_name(format!("{NAME}/keys/0123456789abcdef"))
            .set_private_key_data(bytes::Bytes::from_static(data))
    }

    #[tokio::test]
    async fn writes_key_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("binge-plus-sa-key.json");
        let mut mock = MockServiceAccounts::new();
        mock.expect_create_service_account_key()
            .with(eq(NAME.to_string()))
            .times(1)
            .returning(|_| Ok(key(KEY_DATA)));

        let mut console = Console::new(Vec::new());
        let got = mint_and_persist_key(&mock, &identity()?, &path, &mut console).await?;
        assert_eq!(got, path);
        assert_eq!(std::fs::read(&path)?, KEY_DATA);
        let output = String::from_utf8(console.into_inner())?;
        assert!(output.contains("✅ Service account key saved to"), "{output}");
        Ok(())
    }

    // There is no existence check for the key file, every run replaces it.
    #[tokio::test]
    async fn overwrites_existing_key_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("binge-plus-sa-key.json");
        std::fs::write(&path, "a much longer previous key file that must not leave a tail")?;
        let mut mock = MockServiceAccounts::new();
        mock.expect_create_service_account_key()
            .times(1)
            .returning(|_| Ok(key(KEY_DATA)));

        let mut console = Console::new(Vec::new());
        mint_and_persist_key(&mock, &identity()?, &path, &mut console).await?;
        assert_eq!(std::fs::read(&path)?, KEY_DATA);
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn new_key_file_is_private() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("binge-plus-sa-key.json");
        let mut mock = MockServiceAccounts::new();
        mock.expect_create_service_account_key()
            .returning(|_| Ok(key(KEY_DATA)));

        let mut console = Console::new(Vec::new());
        mint_and_persist_key(&mock, &identity()?, &path, &mut console).await?;
        let mode = std::fs::metadata(&path)?.permissions().mode();
        assert_eq!(mode & 0o777, 0o600, "{mode:o}");
        Ok(())
    }

    #[tokio::test]
    async fn mint_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("binge-plus-sa-key.json");
        let mut mock = MockServiceAccounts::new();
        mock.expect_create_service_account_key()
            .returning(|_| Err(status_error(Code::FailedPrecondition)));

        let mut console = Console::new(Vec::new());
        let got = mint_and_persist_key(&mock, &identity()?, &path, &mut console).await;
        assert!(matches!(got, Err(Error::KeyMint { .. })), "{got:?}");
        assert!(!path.exists());
        let output = String::from_utf8(console.into_inner())?;
        assert!(output.starts_with("❌"), "{output}");
        Ok(())
    }

    #[tokio::test]
    async fn empty_key() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("binge-plus-sa-key.json");
        let mut mock = MockServiceAccounts::new();
        mock.expect_create_service_account_key()
            .returning(|_| Ok(key(b"")));

        let mut console = Console::new(Vec::new());
        let got = mint_and_persist_key(&mock, &identity()?, &path, &mut console).await;
        assert!(matches!(got, Err(Error::EmptyKey { .. })), "{got:?}");
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn write_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("missing-directory").join("key.json");
        let mut mock = MockServiceAccounts::new();
        mock.expect_create_service_account_key()
            .returning(|_| Ok(key(KEY_DATA)));

        let mut console = Console::new(Vec::new());
        let got = mint_and_persist_key(&mock, &identity()?, &path, &mut console).await;
        match got {
            Err(Error::KeyWrite { path: ref p, .. }) => assert_eq!(p, &path),
            _ => panic!("expected a write error, got {got:?}"),
        }
        Ok(())
    }
}
