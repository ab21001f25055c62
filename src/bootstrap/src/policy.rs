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

//! Grants the service account its roles on the project.
//!
//! The project IAM policy is fetched once, merged locally, and written back
//! with a single call. The merge only ever adds members: existing bindings,
//! including bindings for unrelated roles and members, are preserved.

use crate::config::member_for;
use crate::console::Console;
use crate::project::ProjectId;
use crate::stub::Policies;
use crate::{Error, Result};
use google_cloud_iam_v1::model::{Binding, Policy};
use std::io::Write;

const ROLE_PREFIXES: [&str; 3] = ["roles/", "projects/", "organizations/"];

/// The IAM policy version requested when reading the project policy.
///
/// Lower versions omit conditional bindings, and writing such a policy back
/// fails on projects that have them.
pub const POLICY_VERSION: i32 = 3;

/// How [merge_role] changed a policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleChange {
    /// The member was already bound to the role, nothing changed.
    AlreadyAssigned,
    /// The member was appended to an existing binding.
    MemberAdded,
    /// A new binding was added with the member as its only entry.
    BindingAdded,
}

/// The role cannot be used in a policy binding.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("malformed role {0:?}, roles must start with `roles/`, `projects/` or `organizations/`")]
pub struct InvalidRole(pub String);

/// Adds `member` to the unconditional binding for `role`.
///
/// Bindings with an IAM condition are never modified. The member is never
/// duplicated and no other binding is touched.
pub fn merge_role(
    policy: &mut Policy,
    role: &str,
    member: &str,
) -> std::result::Result<RoleChange, InvalidRole> {
    validate_role(role)?;
    let binding = policy
        .bindings
        .iter_mut()
        .find(|b| b.role == role && b.condition.is_none());
    match binding {
        Some(b) if b.members.iter().any(|m| m == member) => Ok(RoleChange::AlreadyAssigned),
        Some(b) => {
            b.members.push(member.to_string());
            Ok(RoleChange::MemberAdded)
        }
        None => {
            policy
                .bindings
                .push(Binding::new().set_role(role).set_members([member]));
            Ok(RoleChange::BindingAdded)
        }
    }
}

fn validate_role(role: &str) -> std::result::Result<(), InvalidRole> {
    let well_formed = ROLE_PREFIXES
        .iter()
        .any(|p| role.len() > p.len() && role.starts_with(p))
        && !role.contains(char::is_whitespace);
    if well_formed {
        Ok(())
    } else {
        Err(InvalidRole(role.to_string()))
    }
}

/// Ensures each role in `roles` is bound to the service account `email`.
///
/// Returns the roles granted by this call, in the order of `roles`. Roles
/// that were already granted are not included. A malformed role is reported
/// and skipped. Failing to fetch or write the policy is fatal.
///
/// The policy is read at [POLICY_VERSION] and written only if it changed.
/// The write keeps the version and `etag` of the fetched policy, so the
/// service rejects it if the policy changed in between.
pub async fn ensure_role_bindings<W: Write>(
    stub: &dyn Policies,
    project_id: &ProjectId,
    email: &str,
    roles: &[String],
    console: &mut Console<W>,
) -> Result<Vec<String>> {
    let resource = project_id.resource_name();
    let policy_error = |source| Error::Policy {
        project: project_id.to_string(),
        source,
    };
    let mut policy = match stub.get_iam_policy(resource.clone(), POLICY_VERSION).await {
        Ok(p) => p,
        Err(e) => {
            let error = policy_error(e);
            console.failure(format!("Error fetching the project IAM policy: {error}"));
            return Err(error);
        }
    };
    tracing::debug!(
        "fetched policy for {resource} with {} bindings",
        policy.bindings.len()
    );

    let member = member_for(email);
    let mut applied = Vec::new();
    for role in roles {
        match merge_role(&mut policy, role, &member) {
            Ok(RoleChange::AlreadyAssigned) => {
                tracing::info!("{member} already has {role}");
                console.warning(format!("Role {role} already assigned."));
            }
            Ok(change) => {
                tracing::info!("{role} for {member}: {change:?}");
                applied.push(role.clone());
            }
            Err(e) => {
                tracing::warn!("skipping role for {member}: {e}");
                console.failure(format!("Error assigning role {role}: {e}"));
            }
        }
    }

    if applied.is_empty() {
        tracing::info!("policy for {resource} unchanged, skipping the update");
        return Ok(applied);
    }
    if let Err(e) = stub.set_iam_policy(resource, policy).await {
        let error = policy_error(e);
        console.failure(format!("Error updating the project IAM policy: {error}"));
        return Err(error);
    }
    for role in &applied {
        console.success(format!("Assigned role: {role}"));
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::tests::status_error;
    use crate::stub::tests::MockPolicies;
    use google_cloud_gax::error::rpc::Code;
    use google_cloud_iam_v1::model::Binding;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const EMAIL: &str = "binge-plus-sa@binge-plus-1.iam.gserviceaccount.com";
    const MEMBER: &str = "serviceAccount:binge-plus-sa@binge-plus-1.iam.gserviceaccount.com";

    fn project() -> anyhow::Result<ProjectId> {
        Ok(ProjectId::new("binge-plus-1")?)
    }

    fn roles(roles: &[&str]) -> Vec<String> {
        roles.iter().map(|r| r.to_string()).collect()
    }

    fn existing_policy() -> Policy {
        Policy::new()
            .set_etag(bytes::Bytes::from_static(b"etag-1"))
            .set_bindings([
                Binding::new()
                    .set_role("roles/owner")
                    .set_members(["user:admin@example.com"]),
                Binding::new()
                    .set_role("roles/run.viewer")
                    .set_members(["user:dev@example.com", MEMBER]),
                Binding::new()
                    .set_role("roles/compute.viewer")
                    .set_members(["group:ops@example.com"]),
            ])
    }

    fn members(policy: &Policy, role: &str) -> Vec<String> {
        policy
            .bindings
            .iter()
            .filter(|b| b.role == role)
            .flat_map(|b| b.members.clone())
            .collect()
    }

    #[test]
    fn merge_already_assigned() {
        let mut policy = existing_policy();
        let got = merge_role(&mut policy, "roles/run.viewer", MEMBER);
        assert_eq!(got, Ok(RoleChange::AlreadyAssigned));
        assert_eq!(policy, existing_policy());
    }

    #[test]
    fn merge_member_added() {
        let mut policy = existing_policy();
        let got = merge_role(&mut policy, "roles/compute.viewer", MEMBER);
        assert_eq!(got, Ok(RoleChange::MemberAdded));
        assert_eq!(
            members(&policy, "roles/compute.viewer"),
            ["group:ops@example.com", MEMBER]
        );
        assert_eq!(policy.bindings.len(), 3);
    }

    #[test]
    fn merge_binding_added() {
        let mut policy = existing_policy();
        let got = merge_role(&mut policy, "roles/pubsub.viewer", MEMBER);
        assert_eq!(got, Ok(RoleChange::BindingAdded));
        assert_eq!(policy.bindings.len(), 4);
        assert_eq!(members(&policy, "roles/pubsub.viewer"), [MEMBER]);
        assert_eq!(members(&policy, "roles/owner"), ["user:admin@example.com"]);
    }

    #[test]
    fn merge_skips_conditional_binding() {
        let conditional = Binding::new()
            .set_role("roles/storage.objectAdmin")
            .set_members([MEMBER])
            .set_condition(google_cloud_type::model::Expr::new().set_expression("true"));
        let mut policy = Policy::new().set_bindings([conditional.clone()]);
        let got = merge_role(&mut policy, "roles/storage.objectAdmin", MEMBER);
        assert_eq!(got, Ok(RoleChange::BindingAdded));
        assert_eq!(policy.bindings.len(), 2);
        assert_eq!(policy.bindings[0], conditional);
        assert!(policy.bindings[1].condition.is_none());
    }

    #[test]
    fn merge_is_idempotent() {
        let mut policy = Policy::new();
        for _ in 0..3 {
            let _ = merge_role(&mut policy, "roles/run.viewer", MEMBER);
        }
        assert_eq!(members(&policy, "roles/run.viewer"), [MEMBER]);
    }

    #[test_case(""; "empty")]
    #[test_case("roles/"; "prefix only")]
    #[test_case("run.viewer"; "no prefix")]
    #[test_case("roles/run viewer"; "whitespace")]
    fn merge_invalid_role(role: &str) {
        let mut policy = existing_policy();
        let got = merge_role(&mut policy, role, MEMBER);
        assert_eq!(got, Err(InvalidRole(role.to_string())));
        assert_eq!(policy, existing_policy());
    }

    #[test_case("roles/run.viewer")]
    #[test_case("projects/binge-plus-1/roles/custom")]
    #[test_case("organizations/123/roles/custom")]
    fn valid_roles(role: &str) {
        assert_eq!(validate_role(role), Ok(()));
    }

    #[tokio::test]
    async fn single_write_with_merged_policy() -> anyhow::Result<()> {
        let mut mock = MockPolicies::new();
        mock.expect_get_iam_policy()
            .with(eq("projects/binge-plus-1".to_string()), eq(POLICY_VERSION))
            .times(1)
            .returning(|_, _| Ok(existing_policy().set_version(3)));
        mock.expect_set_iam_policy()
            .withf(|resource, policy| {
                resource == "projects/binge-plus-1"
                    && policy.etag == bytes::Bytes::from_static(b"etag-1")
                    && policy.version == 3
                    && policy.bindings.len() == 4
            })
            .times(1)
            .returning(|_, policy| Ok(policy));

        let mut console = Console::new(Vec::new());
        let got = ensure_role_bindings(
            &mock,
            &project()?,
            EMAIL,
            &roles(&["roles/pubsub.viewer", "roles/run.viewer", "roles/compute.viewer"]),
            &mut console,
        )
        .await?;
        assert_eq!(got, ["roles/pubsub.viewer", "roles/compute.viewer"]);

        let output = String::from_utf8(console.into_inner())?;
        assert!(output.contains("⚠️ Role roles/run.viewer already assigned."), "{output}");
        assert!(output.contains("✅ Assigned role: roles/pubsub.viewer"), "{output}");
        assert!(output.contains("✅ Assigned role: roles/compute.viewer"), "{output}");
        Ok(())
    }

    #[tokio::test]
    async fn unchanged_policy_is_not_written() -> anyhow::Result<()> {
        let mut mock = MockPolicies::new();
        mock.expect_get_iam_policy()
            .times(1)
            .returning(|_, _| Ok(existing_policy()));
        mock.expect_set_iam_policy().never();

        let mut console = Console::new(Vec::new());
        let got = ensure_role_bindings(
            &mock,
            &project()?,
            EMAIL,
            &roles(&["roles/run.viewer"]),
            &mut console,
        )
        .await?;
        assert!(got.is_empty(), "{got:?}");
        Ok(())
    }

    #[tokio::test]
    async fn invalid_role_is_skipped() -> anyhow::Result<()> {
        let mut mock = MockPolicies::new();
        mock.expect_get_iam_policy()
            .returning(|_, _| Ok(Policy::new()));
        mock.expect_set_iam_policy()
            .withf(|_, policy| policy.bindings.len() == 1)
            .times(1)
            .returning(|_, policy| Ok(policy));

        let mut console = Console::new(Vec::new());
        let got = ensure_role_bindings(
            &mock,
            &project()?,
            EMAIL,
            &roles(&["not-a-role", "roles/run.viewer"]),
            &mut console,
        )
        .await?;
        assert_eq!(got, ["roles/run.viewer"]);
        let output = String::from_utf8(console.into_inner())?;
        assert!(output.contains("❌ Error assigning role not-a-role"), "{output}");
        Ok(())
    }

    #[tokio::test]
    async fn fetch_error_is_fatal() -> anyhow::Result<()> {
        let mut mock = MockPolicies::new();
        mock.expect_get_iam_policy()
            .returning(|_, _| Err(status_error(Code::PermissionDenied)));
        mock.expect_set_iam_policy().never();

        let mut console = Console::new(Vec::new());
        let got = ensure_role_bindings(
            &mock,
            &project()?,
            EMAIL,
            &roles(&["roles/run.viewer"]),
            &mut console,
        )
        .await;
        assert!(matches!(got, Err(Error::Policy { .. })), "{got:?}");
        Ok(())
    }

    #[tokio::test]
    async fn write_error_is_fatal() -> anyhow::Result<()> {
        let mut mock = MockPolicies::new();
        mock.expect_get_iam_policy()
            .returning(|_, _| Ok(Policy::new()));
        mock.expect_set_iam_policy()
            .times(1)
            .returning(|_, _| Err(status_error(Code::Aborted)));

        let mut console = Console::new(Vec::new());
        let got = ensure_role_bindings(
            &mock,
            &project()?,
            EMAIL,
            &roles(&["roles/run.viewer"]),
            &mut console,
        )
        .await;
        assert!(matches!(got, Err(Error::Policy { .. })), "{got:?}");
        let output = String::from_utf8(console.into_inner())?;
        assert!(!output.contains("Assigned role"), "{output}");
        Ok(())
    }
}
