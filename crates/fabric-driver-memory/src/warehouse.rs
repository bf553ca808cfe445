use crate::eval::{self, Env, Row};

use fabric_core::{
    driver::{operation::Transaction, Capability, Response},
    schema::Column,
    stmt::{
        ConstraintDef, Delete, DeleteFilter, Insert, InsertSource, Merge, Query, Statement,
        UpdateFrom, Value,
    },
    Error, Relation, RelationKind, Result,
};
use indexmap::IndexMap;
use std::collections::HashMap;

type Key = (String, String, String);

type FailurePredicate = Box<dyn Fn(&Statement) -> bool + Send>;

/// Columns and rows of a table, a view or a query result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Data {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Data {
        Data { columns, rows }
    }

    pub(crate) fn position(&self, name: &str) -> Result<usize> {
        position(&self.columns, name)
    }
}

pub(crate) fn position(columns: &[Column], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|column| column.name == name)
        .ok_or_else(|| Error::warehouse(format!("Invalid column name '{name}'.")))
}

#[derive(Debug, Clone)]
pub(crate) struct Object {
    pub(crate) relation: Relation,
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<Vec<Value>>,

    /// Views only: the defining query.
    pub(crate) definition: Option<Query>,

    /// Views only: relations the definition reads.
    pub(crate) depends_on: Vec<Relation>,

    /// `(privilege, grantee)`
    pub(crate) grants: Vec<(String, String)>,

    pub(crate) constraints: Vec<ConstraintDef>,
}

impl Object {
    pub(crate) fn table(
        relation: &Relation,
        columns: Vec<Column>,
        rows: Vec<Vec<Value>>,
    ) -> Object {
        Object {
            relation: relation.as_kind(RelationKind::Table),
            columns,
            rows,
            definition: None,
            depends_on: vec![],
            grants: vec![],
            constraints: vec![],
        }
    }

    pub(crate) fn view_of(relation: &Relation, reads: &Relation) -> Object {
        Object {
            relation: relation.as_kind(RelationKind::View),
            columns: vec![],
            rows: vec![],
            definition: Some(Query::Select(fabric_core::stmt::Select::star(reads))),
            depends_on: vec![reads.clone()],
            grants: vec![],
            constraints: vec![],
        }
    }

    fn is_view(&self) -> bool {
        self.relation.is_view()
    }
}

/// A registered model query.
#[derive(Debug, Clone)]
pub(crate) enum Registered {
    Static(Data),
    Select(Relation),
}

pub(crate) struct Warehouse {
    pub(crate) capability: &'static Capability,
    pub(crate) objects: IndexMap<Key, Object>,
    pub(crate) queries: HashMap<String, Registered>,
    pub(crate) now: String,
    pub(crate) duplicates: Vec<Relation>,
    pub(crate) statements: Vec<Statement>,
    pub(crate) sql_log: Vec<String>,
    failures: Vec<(FailurePredicate, String)>,

    /// Objects as of `BEGIN`, restored on `ROLLBACK`.
    checkpoint: Option<IndexMap<Key, Object>>,
}

fn key(relation: &Relation) -> Key {
    (
        relation.database().to_string(),
        relation.schema().to_string(),
        relation.identifier().to_string(),
    )
}

/// Normalizes model SQL the way the serializer embeds it.
pub(crate) fn normalize(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}

impl Warehouse {
    pub(crate) fn new(capability: &'static Capability) -> Warehouse {
        Warehouse {
            capability,
            objects: IndexMap::new(),
            queries: HashMap::new(),
            now: "2024-01-01 00:00:00.000000".to_string(),
            duplicates: vec![],
            statements: vec![],
            sql_log: vec![],
            failures: vec![],
            checkpoint: None,
        }
    }

    pub(crate) fn register_static(&mut self, sql: &str, data: Data) {
        self.queries
            .insert(normalize(sql).to_string(), Registered::Static(data));
    }

    pub(crate) fn register_select(&mut self, sql: &str, relation: &Relation) {
        self.queries
            .insert(normalize(sql).to_string(), Registered::Select(relation.clone()));
    }

    pub(crate) fn fail_when(&mut self, predicate: FailurePredicate, message: String) {
        self.failures.push((predicate, message));
    }

    pub(crate) fn insert_object(&mut self, object: Object) {
        self.objects.insert(key(&object.relation), object);
    }

    pub(crate) fn get(&self, relation: &Relation) -> Option<&Object> {
        self.objects.get(&key(relation))
    }

    fn get_mut(&mut self, relation: &Relation) -> Result<&mut Object> {
        self.objects
            .get_mut(&key(relation))
            .ok_or_else(|| invalid_object(relation))
    }

    pub(crate) fn grant(&mut self, relation: &Relation, privilege: &str, grantee: &str) {
        if let Ok(object) = self.get_mut(relation) {
            let grant = (privilege.to_ascii_lowercase(), grantee.to_string());
            if !object.grants.contains(&grant) {
                object.grants.push(grant);
            }
        }
    }

    pub(crate) fn transaction(&mut self, op: Transaction) -> Result<()> {
        if !self.capability.multi_statement_transactions {
            return Err(Error::warehouse(
                "multi-statement transactions are not supported",
            ));
        }

        match op {
            Transaction::Start => {
                if self.checkpoint.is_some() {
                    return Err(Error::warehouse("a transaction is already open"));
                }
                self.checkpoint = Some(self.objects.clone());
            }
            Transaction::Commit => {
                self.checkpoint = None;
            }
            Transaction::Rollback => {
                if let Some(objects) = self.checkpoint.take() {
                    self.objects = objects;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn exec(
        &mut self,
        stmt: &Statement,
        params: usize,
        fetch: bool,
    ) -> Result<Response> {
        if let Some((_, message)) = self.failures.iter().find(|(predicate, _)| predicate(stmt)) {
            return Err(Error::warehouse(message.clone()));
        }

        let parameter_ceiling = self.capability.max_insert_parameters + 1;
        if params > parameter_ceiling {
            return Err(Error::warehouse(format!(
                "The incoming request has too many parameters. \
                 The server supports a maximum of {parameter_ceiling} parameters."
            )));
        }

        let count = match stmt {
            Statement::Query(query) => {
                let data = self.eval_query(query)?;
                if fetch {
                    return Ok(Response::values(eval::result_set(data)));
                }
                data.rows.len() as u64
            }
            Statement::CreateSchema(_) => 0,
            Statement::CreateTable(stmt) => {
                self.ensure_absent(&stmt.relation)?;
                self.insert_object(Object::table(&stmt.relation, stmt.columns.clone(), vec![]));
                0
            }
            Statement::CreateTableAs(stmt) => {
                self.ensure_absent(&stmt.relation)?;
                self.ensure_nestable(&stmt.query)?;
                let data = self.eval_query(&stmt.query)?;
                let count = data.rows.len() as u64;
                self.insert_object(Object::table(&stmt.relation, data.columns, data.rows));
                count
            }
            Statement::CreateView(stmt) => {
                if !stmt.or_replace {
                    self.ensure_absent(&stmt.relation)?;
                } else if self.get(&stmt.relation).is_some_and(|object| !object.is_view()) {
                    return Err(already_exists(&stmt.relation));
                }
                // Views are validated at creation, like the warehouse binds them.
                self.eval_query(&stmt.query)?;
                let depends_on = self.dependencies_of(&stmt.query);
                let grants = self
                    .get(&stmt.relation)
                    .map(|object| object.grants.clone())
                    .unwrap_or_default();
                self.insert_object(Object {
                    relation: stmt.relation.as_kind(RelationKind::View),
                    columns: vec![],
                    rows: vec![],
                    definition: Some(stmt.query.clone()),
                    depends_on,
                    grants,
                    constraints: vec![],
                });
                0
            }
            Statement::DropRelation(stmt) => {
                self.drop_relation(&stmt.relation, stmt.if_exists, stmt.cascade)?;
                0
            }
            Statement::RenameRelation(stmt) => {
                self.rename(&stmt.from, &stmt.to)?;
                0
            }
            Statement::AddColumns(stmt) => {
                if !self.capability.alter_add_column {
                    return Err(unsupported("ALTER TABLE ADD"));
                }
                let object = self.table_mut(&stmt.relation)?;
                for column in &stmt.columns {
                    object.columns.push(column.clone());
                    for row in &mut object.rows {
                        row.push(Value::Null);
                    }
                }
                0
            }
            Statement::DropColumns(stmt) => {
                if !self.capability.alter_drop_column {
                    return Err(unsupported("ALTER TABLE DROP COLUMN"));
                }
                let object = self.table_mut(&stmt.relation)?;
                for name in &stmt.columns {
                    let index = position(&object.columns, name)?;
                    object.columns.remove(index);
                    for row in &mut object.rows {
                        row.remove(index);
                    }
                }
                0
            }
            Statement::AddConstraint(stmt) => {
                let object = self.table_mut(&stmt.relation)?;
                if object
                    .constraints
                    .iter()
                    .any(|existing| existing.name == stmt.constraint.name)
                {
                    return Err(Error::warehouse(format!(
                        "There is already an object named '{}' in the database.",
                        stmt.constraint.name
                    )));
                }
                object.constraints.push(stmt.constraint.clone());
                0
            }
            Statement::Truncate(stmt) => {
                if !self.capability.truncate {
                    return Err(unsupported("TRUNCATE TABLE"));
                }
                let object = self.table_mut(&stmt.relation)?;
                let count = object.rows.len() as u64;
                object.rows.clear();
                count
            }
            Statement::Grant(stmt) => {
                self.get_mut(&stmt.relation)?;
                for grantee in &stmt.grantees {
                    self.grant(&stmt.relation, &stmt.privilege, grantee);
                }
                0
            }
            Statement::Revoke(stmt) => {
                let privilege = stmt.privilege.to_ascii_lowercase();
                let object = self.get_mut(&stmt.relation)?;
                object.grants.retain(|(existing, grantee)| {
                    *existing != privilege || !stmt.grantees.contains(grantee)
                });
                0
            }
            Statement::Insert(stmt) => self.insert(stmt)?,
            Statement::Delete(stmt) => self.delete(stmt)?,
            Statement::Merge(stmt) => self.merge(stmt)?,
            Statement::UpdateFrom(stmt) => self.update_from(stmt)?,
        };

        if fetch {
            Ok(Response::empty_values())
        } else {
            Ok(Response::count(count))
        }
    }

    fn ensure_absent(&self, relation: &Relation) -> Result<()> {
        if self.get(relation).is_some() {
            return Err(already_exists(relation));
        }
        Ok(())
    }

    /// Queries opening with a CTE cannot be nested when the warehouse needs
    /// them staged behind a view.
    fn ensure_nestable(&self, query: &Query) -> Result<()> {
        let opens_with_cte = match query {
            Query::Sql(sql) => normalize(sql).to_ascii_lowercase().starts_with("with "),
            // Rendered as a chain of CTEs.
            Query::SnapshotStaging(_) => true,
            _ => false,
        };

        if self.capability.view_indirection_for_cte && opens_with_cte {
            return Err(Error::warehouse("Incorrect syntax near the keyword 'WITH'."));
        }
        Ok(())
    }

    fn table_mut(&mut self, relation: &Relation) -> Result<&mut Object> {
        let object = self.get_mut(relation)?;
        if object.is_view() {
            return Err(Error::warehouse(format!(
                "'{}' is a view; the operation requires a table.",
                relation.identifier()
            )));
        }
        Ok(object)
    }

    /// Views reading `relation`, directly.
    pub(crate) fn dependents(&self, relation: &Relation) -> Vec<Relation> {
        self.objects
            .values()
            .filter(|object| {
                object
                    .depends_on
                    .iter()
                    .any(|dependency| dependency.same_name(relation))
            })
            .map(|object| object.relation.clone())
            .collect()
    }

    fn dependencies_of(&self, query: &Query) -> Vec<Relation> {
        match query {
            Query::Sql(sql) => match self.queries.get(normalize(sql)) {
                Some(Registered::Select(relation)) => vec![relation.clone()],
                _ => vec![],
            },
            Query::Select(select) => vec![select.from.clone()],
            Query::Count(relation) => vec![relation.clone()],
            Query::TestResult(test) => vec![test.query.from.clone()],
            Query::SnapshotBuild(build) => vec![build.source.clone()],
            Query::SnapshotStaging(staging) => vec![staging.source.clone(), staging.target.clone()],
            Query::Catalog(_) => vec![],
        }
    }

    fn drop_relation(&mut self, relation: &Relation, if_exists: bool, cascade: bool) -> Result<()> {
        let Some(object) = self.get(relation) else {
            if if_exists {
                return Ok(());
            }
            return Err(invalid_object(relation));
        };

        if object.relation.kind() != relation.kind() {
            return Err(Error::warehouse(format!(
                "Cannot use DROP {} with '{}' because '{}' is a {}. Use DROP {}.",
                relation.kind().as_str().to_ascii_uppercase(),
                relation.identifier(),
                relation.identifier(),
                object.relation.kind().as_str(),
                object.relation.kind().as_str().to_ascii_uppercase(),
            )));
        }

        if object.is_view() {
            let dependents = self.dependents(relation);
            if !dependents.is_empty() && (!cascade || !self.capability.cascade_view_drop) {
                return Err(Error::warehouse(format!(
                    "Cannot DROP VIEW '{}' because it is being referenced by object '{}'.",
                    relation.identifier(),
                    dependents[0].identifier()
                )));
            }
            for dependent in dependents {
                self.drop_relation(&dependent, true, true)?;
            }
        }

        self.objects.shift_remove(&key(relation));
        Ok(())
    }

    fn rename(&mut self, from: &Relation, to: &Relation) -> Result<()> {
        if from.database() != to.database() {
            return Err(Error::warehouse("renames cannot cross databases"));
        }
        if from.schema() != to.schema() && !self.capability.rename_across_schema {
            return Err(Error::warehouse(format!(
                "Either the parameter @objname is ambiguous or the claimed @objtype (OBJECT) \
                 is wrong: cannot move '{}' to schema '{}'.",
                from.identifier(),
                to.schema()
            )));
        }
        if self.get(to).is_some() {
            return Err(already_exists(to));
        }

        let Some(mut object) = self.objects.shift_remove(&key(from)) else {
            return Err(invalid_object(from));
        };
        object.relation = Relation::new(
            to.database(),
            to.schema(),
            to.identifier(),
            object.relation.kind(),
        )?;
        let renamed = object.relation.clone();
        self.insert_object(object);

        // Dependencies are tracked by object, so they follow the rename.
        for object in self.objects.values_mut() {
            for dependency in &mut object.depends_on {
                if dependency.same_name(from) {
                    *dependency = renamed.clone();
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, stmt: &Insert) -> Result<u64> {
        let rows = match &stmt.source {
            InsertSource::Select(select) => {
                let data = self.eval_query(&Query::Select(select.clone()))?;
                if data.columns.len() != stmt.columns.len() {
                    return Err(Error::warehouse(
                        "The select list for the INSERT statement contains a different number \
                         of items than the insert list.",
                    ));
                }
                data.rows
            }
            InsertSource::Values(rows) => {
                if rows.len() > self.capability.max_insert_rows {
                    return Err(Error::warehouse(format!(
                        "The number of row value expressions in the INSERT statement exceeds \
                         the maximum allowed number of {} row values.",
                        self.capability.max_insert_rows
                    )));
                }
                rows.clone()
            }
        };

        let object = self.table_mut(&stmt.target)?;
        let positions = stmt
            .columns
            .iter()
            .map(|name| position(&object.columns, name))
            .collect::<Result<Vec<_>>>()?;

        let mut inserted = Vec::with_capacity(rows.len());
        for values in rows {
            let mut row = vec![Value::Null; object.columns.len()];
            for (index, value) in positions.iter().zip(values) {
                row[*index] = value;
            }
            check_not_null(&object.columns, &row, &object.relation)?;
            inserted.push(row);
        }

        let count = inserted.len() as u64;
        object.rows.extend(inserted);
        Ok(count)
    }

    fn delete(&mut self, stmt: &Delete) -> Result<u64> {
        let source = match &stmt.filter {
            DeleteFilter::MatchingKeys { source, .. } => Some(self.read(source)?),
            _ => None,
        };

        let now = self.now.clone();
        let object = self.table_mut(&stmt.target)?;
        let before = object.rows.len();

        let mut kept = Vec::with_capacity(before);
        for row in std::mem::take(&mut object.rows) {
            let target = Row::new(&object.columns, &row);
            let env = Env::target(target, &now);

            let remove = match &stmt.filter {
                DeleteFilter::All => true,
                DeleteFilter::Predicates(predicates) => env.all(predicates)?,
                DeleteFilter::MatchingKeys {
                    unique_key,
                    predicates,
                    ..
                } => {
                    let source = source.as_ref().ok_or_else(|| {
                        Error::warehouse("delete source was not evaluated")
                    })?;
                    let mut matched = false;
                    for source_row in &source.rows {
                        let source_row = Row::new(&source.columns, source_row);
                        if eval::keys_match(unique_key, &source_row, &target)? {
                            matched = true;
                            break;
                        }
                    }
                    matched && env.all(predicates)?
                }
            };

            if !remove {
                kept.push(row);
            }
        }

        let count = (before - kept.len()) as u64;
        object.rows = kept;
        Ok(count)
    }

    fn merge(&mut self, stmt: &Merge) -> Result<u64> {
        if !self.capability.merge {
            return Err(unsupported("MERGE"));
        }

        let source = self.read(&stmt.source)?;
        let now = self.now.clone();
        let object = self.table_mut(&stmt.target)?;
        let relation = object.relation.clone();
        let columns = object.columns.clone();

        let update_positions = stmt
            .update_columns
            .iter()
            .map(|name| Ok((position(&columns, name)?, source.position(name)?)))
            .collect::<Result<Vec<_>>>()?;
        let insert_positions = stmt
            .insert_columns
            .iter()
            .map(|name| Ok((position(&columns, name)?, source.position(name)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut affected = 0;
        let mut inserts = vec![];

        for source_values in &source.rows {
            let source_row = Row::new(&source.columns, source_values);
            let mut matched = false;

            if !stmt.unique_key.is_empty() {
                for target_values in object.rows.iter_mut() {
                    let is_match = {
                        let target_row = Row::new(&columns, target_values);
                        eval::keys_match(&stmt.unique_key, &source_row, &target_row)?
                            && Env::both(target_row, source_row, &now).all(&stmt.predicates)?
                    };
                    if !is_match {
                        continue;
                    }
                    matched = true;
                    for (target_index, source_index) in &update_positions {
                        target_values[*target_index] = source_values[*source_index].clone();
                    }
                    affected += 1;
                }
            }

            if !matched {
                let mut row = vec![Value::Null; columns.len()];
                for (target_index, source_index) in &insert_positions {
                    row[*target_index] = source_values[*source_index].clone();
                }
                check_not_null(&columns, &row, &relation)?;
                inserts.push(row);
            }
        }

        affected += inserts.len() as u64;
        object.rows.extend(inserts);
        Ok(affected)
    }

    fn update_from(&mut self, stmt: &UpdateFrom) -> Result<u64> {
        let source = self.read(&stmt.source)?;
        let now = self.now.clone();
        let object = self.table_mut(&stmt.target)?;
        let columns = object.columns.clone();

        let assignments = stmt
            .assignments
            .iter()
            .map(|name| Ok((position(&columns, name)?, source.position(name)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut affected = 0;
        for target_values in object.rows.iter_mut() {
            let mut update = None;
            for source_values in &source.rows {
                let target_row = Row::new(&columns, target_values);
                let source_row = Row::new(&source.columns, source_values);
                if eval::keys_match(&stmt.join, &source_row, &target_row)?
                    && Env::both(target_row, source_row, &now).all(&stmt.filter)?
                {
                    update = Some(source_values);
                    break;
                }
            }

            if let Some(source_values) = update {
                for (target_index, source_index) in &assignments {
                    target_values[*target_index] = source_values[*source_index].clone();
                }
                affected += 1;
            }
        }
        Ok(affected)
    }
}

fn check_not_null(columns: &[Column], row: &[Value], relation: &Relation) -> Result<()> {
    for (column, value) in columns.iter().zip(row) {
        if !column.nullable && value.is_null() {
            return Err(Error::warehouse(format!(
                "Cannot insert the value NULL into column '{}', table '{}'; \
                 column does not allow nulls. INSERT fails.",
                column.name, relation
            )));
        }
    }
    Ok(())
}

fn invalid_object(relation: &Relation) -> Error {
    Error::warehouse(format!("Invalid object name '{relation}'."))
}

fn already_exists(relation: &Relation) -> Error {
    Error::warehouse(format!(
        "There is already an object named '{}' in the database.",
        relation.identifier()
    ))
}

fn unsupported(operation: &str) -> Error {
    Error::warehouse(format!("{operation} is not supported in this edition of SQL Server."))
}
