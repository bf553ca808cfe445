use crate::Adapter;

use fabric_core::{config::Grants, stmt::Statement, Relation, Result};
use indexmap::{IndexMap, IndexSet};

/// How configured grants meet the grants already on a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GrantMode {
    /// Full builds: the configuration is the complete list, so anything else
    /// is revoked.
    Replace,

    /// Incremental runs: only missing grants are added; nothing is revoked.
    Additive,
}

impl Adapter {
    /// Applies grants to a relation whose data is already committed.
    pub(crate) async fn apply_grants(
        &mut self,
        relation: &Relation,
        grants: &Grants,
        mode: GrantMode,
    ) -> Result<()> {
        if grants.is_empty() {
            return Ok(());
        }

        let existing = self.grants_of(relation).await?;
        for stmt in plan(relation, grants, &existing, mode) {
            self.execute(stmt).await?;
        }
        Ok(())
    }

    /// Grants on `to` everything held on `from`, configured or not.
    pub(crate) async fn copy_grants(&mut self, from: &Relation, to: &Relation) -> Result<()> {
        let existing = self.grants_of(from).await?;
        for stmt in copied(to, &existing) {
            self.execute(stmt).await?;
        }
        Ok(())
    }
}

/// One `GRANT` per privilege, in the order privileges were found.
fn copied(relation: &Relation, existing: &[(String, String)]) -> Vec<Statement> {
    let mut by_privilege = IndexMap::<&str, Vec<String>>::new();
    for (privilege, grantee) in existing {
        by_privilege
            .entry(privilege.as_str())
            .or_default()
            .push(grantee.clone());
    }

    by_privilege
        .into_iter()
        .map(|(privilege, grantees)| Statement::grant(relation, privilege, grantees))
        .collect()
}

fn plan(
    relation: &Relation,
    grants: &Grants,
    existing: &[(String, String)],
    mode: GrantMode,
) -> Vec<Statement> {
    let mut stmts = vec![];

    if mode == GrantMode::Replace {
        let privileges = existing
            .iter()
            .map(|(privilege, _)| privilege)
            .collect::<IndexSet<_>>();

        for privilege in privileges {
            let wanted = grants
                .iter()
                .find(|(configured, _)| configured.eq_ignore_ascii_case(privilege))
                .map(|(_, grantees)| grantees)
                .unwrap_or_default();

            let revoked = existing
                .iter()
                .filter(|(current, grantee)| current == privilege && !wanted.contains(grantee))
                .map(|(_, grantee)| grantee.clone())
                .collect::<Vec<_>>();

            if !revoked.is_empty() {
                stmts.push(Statement::revoke(relation, privilege, revoked));
            }
        }
    }

    for (privilege, grantees) in grants.iter() {
        let missing = grantees
            .iter()
            .filter(|grantee| {
                !existing.iter().any(|(current, holder)| {
                    current.eq_ignore_ascii_case(privilege) && holder == *grantee
                })
            })
            .cloned()
            .collect::<Vec<_>>();

        if !missing.is_empty() {
            stmts.push(Statement::grant(relation, privilege, missing));
        }
    }

    stmts
}
