use crate::Adapter;

use fabric_core::{err, stmt::Statement, Error, Relation, Result};
use tracing::{info, warn};

impl Adapter {
    /// Drops whatever is stored under `relation`'s name, if anything.
    ///
    /// The catalog decides the kind to drop, so a leftover view under a table
    /// name (or the reverse) is still removed.
    pub async fn drop_if_exists(&mut self, relation: &Relation) -> Result<()> {
        match self.get_relation(relation).await? {
            Some(existing) => self.drop_existing(&existing).await,
            None => Ok(()),
        }
    }

    /// Drops an existing relation. Views other views depend on take their
    /// dependents with them: in one `CASCADE` where the warehouse has it,
    /// otherwise one by one, leaves first.
    pub(crate) async fn drop_existing(&mut self, relation: &Relation) -> Result<()> {
        if relation.is_view() {
            if self.capability().cascade_view_drop {
                self.execute(Statement::drop_relation_cascade(relation)).await?;
                return Ok(());
            }

            for view in self.dependent_views(relation).await? {
                warn!(view = %view, dropped = %relation, "dropping dependent view");
                self.execute(Statement::drop_relation(&view)).await?;
            }
        }

        self.execute(Statement::drop_relation(relation)).await?;
        Ok(())
    }

    /// Renames within a schema. The new name keeps `from`'s kind.
    pub(crate) async fn rename_relation(
        &mut self,
        from: &Relation,
        to: &Relation,
    ) -> Result<Relation> {
        if from.database() != to.database()
            || (from.schema() != to.schema() && !self.capability().rename_across_schema)
        {
            return Err(Error::capability_violation(
                from,
                format!("renaming to {to} across schemas"),
            ));
        }

        let to = to.as_kind(from.kind());
        self.execute(Statement::rename_relation(from, &to)).await?;
        Ok(to)
    }

    /// Replaces `existing` with `staged` under `target`'s name:
    ///
    /// 1. rename `existing` to its backup name,
    /// 2. rename `staged` to the target name,
    /// 3. drop the backup.
    ///
    /// Each rename is atomic on its own; the pair is not. A failure in step 2
    /// leaves the target missing and the backup in place, so the error
    /// carries the backup for manual recovery instead of attempting another
    /// rename. Returns the published relation.
    pub(crate) async fn swap_into(
        &mut self,
        staged: &Relation,
        target: &Relation,
        existing: &Relation,
    ) -> Result<Relation> {
        let backup = existing.as_backup(self.run_id());

        // A backup left by an earlier failed run is ours to replace.
        self.drop_if_exists(&backup).await?;

        let backup = self
            .rename_relation(existing, &backup)
            .await
            .map_err(|cause| {
                cause.context(err!("moving {existing} aside failed; target untouched"))
            })?;

        let published = match self.rename_relation(staged, target).await {
            Ok(published) => published,
            Err(cause) => {
                warn!(
                    target = %target,
                    backup = %backup,
                    "publish failed after the target was moved aside"
                );
                return Err(cause.context(Error::backup_retained(target, &backup)));
            }
        };

        if let Err(cause) = self.drop_existing(&backup).await {
            warn!(
                target = %target,
                backup = %backup,
                "published, but the backup could not be dropped"
            );
            return Err(cause.context(Error::backup_retained(target, &backup)));
        }

        info!(target = %published, "swapped staged relation into place");
        Ok(published)
    }
}
