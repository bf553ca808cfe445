mod constraint;
pub use constraint::{ConstraintKind, ConstraintSpec};

mod threshold;
pub use threshold::{Comparison, Threshold};

use crate::{schema::Column, Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// Warehouse dialect. Resolved once, when the adapter configuration loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Fabric,
    Ansi,
}

/// Adapter-wide settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub dialect: Dialect,

    /// Fixed run id; a random one is generated when absent.
    pub run_id: Option<String>,

    /// Prefixed to every statement as `/* ... */`.
    pub query_comment: Option<String>,
}

impl AdapterConfig {
    pub fn from_json(value: serde_json::Value) -> Result<AdapterConfig> {
        Ok(serde_json::from_value(value)?)
    }
}

/// What a model materializes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Materialization {
    #[default]
    View,
    Table,
    Incremental,
    Snapshot,
    Test,
    Seed,
    Ephemeral,
}

impl Materialization {
    pub fn as_str(self) -> &'static str {
        match self {
            Materialization::View => "view",
            Materialization::Table => "table",
            Materialization::Incremental => "incremental",
            Materialization::Snapshot => "snapshot",
            Materialization::Test => "test",
            Materialization::Seed => "seed",
            Materialization::Ephemeral => "ephemeral",
        }
    }
}

impl fmt::Display for Materialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How incremental rows reach an existing target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IncrementalStrategy {
    /// `delete+insert` with a unique key, `append` without.
    #[default]
    Default,
    DeleteInsert,
    Merge,
    Microbatch,
    Append,
}

impl IncrementalStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            IncrementalStrategy::Default => "default",
            IncrementalStrategy::DeleteInsert => "delete+insert",
            IncrementalStrategy::Merge => "merge",
            IncrementalStrategy::Microbatch => "microbatch",
            IncrementalStrategy::Append => "append",
        }
    }
}

impl FromStr for IncrementalStrategy {
    type Err = Error;

    fn from_str(name: &str) -> Result<IncrementalStrategy> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(IncrementalStrategy::Default),
            "delete+insert" | "delete_insert" => Ok(IncrementalStrategy::DeleteInsert),
            "merge" => Ok(IncrementalStrategy::Merge),
            "microbatch" => Ok(IncrementalStrategy::Microbatch),
            "append" => Ok(IncrementalStrategy::Append),
            other => Err(Error::invalid_config(format!(
                "unknown incremental strategy `{other}`; expected one of \
                 default, delete+insert, merge, microbatch, append"
            ))),
        }
    }
}

impl TryFrom<String> for IncrementalStrategy {
    type Error = Error;

    fn try_from(name: String) -> Result<IncrementalStrategy> {
        name.parse()
    }
}

impl From<IncrementalStrategy> for String {
    fn from(strategy: IncrementalStrategy) -> String {
        strategy.as_str().to_string()
    }
}

impl fmt::Display for IncrementalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reaction to column changes between an incremental target and new rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnSchemaChange {
    #[default]
    Ignore,
    AppendNewColumns,
    SyncAllColumns,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFailuresAs {
    #[default]
    Table,
    View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    #[serde(alias = "ERROR")]
    Error,
    #[serde(alias = "WARN")]
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStrategy {
    Timestamp,
    Check,
}

/// Columns compared by the `check` snapshot strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckCols {
    All,
    Columns(Vec<String>),
}

impl<'de> Deserialize<'de> for CheckCols {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(all) if all.eq_ignore_ascii_case("all") => Ok(CheckCols::All),
            OneOrMany::One(column) => Ok(CheckCols::Columns(vec![column])),
            OneOrMany::Many(columns) => Ok(CheckCols::Columns(columns)),
        }
    }
}

/// Whether snapshot rows that vanished from the source are closed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardDeletes {
    #[default]
    Ignore,
    Invalidate,
}

/// One or more columns identifying a row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniqueKey(Vec<String>);

impl UniqueKey {
    pub fn new<I, S>(columns: I) -> UniqueKey
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        UniqueKey(columns.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|key| key.eq_ignore_ascii_case(column))
    }
}

impl<'de> Deserialize<'de> for UniqueKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let columns: Vec<String> = OneOrMany::deserialize(deserializer)?.into();
        Ok(UniqueKey(
            columns
                .into_iter()
                .map(|column| column.trim().to_string())
                .filter(|column| !column.is_empty())
                .collect(),
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Contract {
    pub enforced: bool,
}

/// A declared output column.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub data_type: Option<String>,
    pub constraints: Vec<ConstraintSpec>,
}

/// Privilege name (`select`, `insert`, ...) to grantees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grants(IndexMap<String, Vec<String>>);

impl Grants {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(privilege, grantees)| (privilege.as_str(), grantees.as_slice()))
    }

    pub fn insert(&mut self, privilege: impl Into<String>, grantees: Vec<String>) {
        self.0.insert(privilege.into(), grantees);
    }
}

impl<'de> Deserialize<'de> for Grants {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let raw = IndexMap::<String, OneOrMany>::deserialize(deserializer)?;
        Ok(Grants(
            raw.into_iter()
                .map(|(privilege, grantees)| (privilege.to_ascii_lowercase(), grantees.into()))
                .collect(),
        ))
    }
}

/// Per-model settings, flattened the way the orchestrator supplies them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub materialized: Materialization,
    pub unique_key: UniqueKey,
    pub incremental_strategy: Option<IncrementalStrategy>,
    pub on_schema_change: OnSchemaChange,
    pub contract: Contract,
    pub columns: IndexMap<String, ColumnConfig>,
    pub constraints: Vec<ConstraintSpec>,
    pub grants: Grants,
    pub full_refresh: bool,
    pub incremental_predicates: Vec<String>,
    pub merge_update_columns: Option<Vec<String>>,
    pub merge_exclude_columns: Option<Vec<String>>,

    // Microbatch
    pub event_time: Option<String>,
    pub event_time_start: Option<String>,
    pub event_time_end: Option<String>,

    // Tests
    pub store_failures: bool,
    pub store_failures_as: StoreFailuresAs,
    pub limit: Option<u64>,
    pub warn_if: Threshold,
    pub error_if: Threshold,
    pub severity: Severity,

    // Snapshots
    pub strategy: Option<SnapshotStrategy>,
    pub updated_at: Option<String>,
    pub check_cols: Option<CheckCols>,
    pub hard_deletes: Option<HardDeletes>,
    pub invalidate_hard_deletes: bool,
}

impl Default for ModelConfig {
    fn default() -> ModelConfig {
        ModelConfig {
            materialized: Materialization::default(),
            unique_key: UniqueKey::default(),
            incremental_strategy: None,
            on_schema_change: OnSchemaChange::default(),
            contract: Contract::default(),
            columns: IndexMap::new(),
            constraints: vec![],
            grants: Grants::default(),
            full_refresh: false,
            incremental_predicates: vec![],
            merge_update_columns: None,
            merge_exclude_columns: None,
            event_time: None,
            event_time_start: None,
            event_time_end: None,
            store_failures: false,
            store_failures_as: StoreFailuresAs::default(),
            limit: None,
            warn_if: Threshold::default(),
            error_if: Threshold::default(),
            severity: Severity::default(),
            strategy: None,
            updated_at: None,
            check_cols: None,
            hard_deletes: None,
            invalidate_hard_deletes: false,
        }
    }
}

impl ModelConfig {
    /// Loads and validates a model configuration.
    pub fn from_json(value: serde_json::Value) -> Result<ModelConfig> {
        let config: ModelConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn new(materialized: Materialization) -> ModelConfig {
        ModelConfig {
            materialized,
            ..ModelConfig::default()
        }
    }

    /// Checks option combinations that serde alone cannot.
    pub fn validate(&self) -> Result<()> {
        if self.merge_update_columns.is_some() && self.merge_exclude_columns.is_some() {
            return Err(Error::invalid_config(
                "merge_update_columns and merge_exclude_columns cannot both be set",
            ));
        }

        if self.contract.enforced {
            self.contract_columns()?;
        }

        if self.materialized == Materialization::Snapshot {
            self.snapshot_settings()?;
        }

        if self.strategy() == IncrementalStrategy::Microbatch
            && self.materialized == Materialization::Incremental
        {
            if self.event_time.is_none() {
                return Err(Error::invalid_config(
                    "microbatch strategy requires `event_time`",
                ));
            }
            if self.event_time_start.is_none() && self.event_time_end.is_none() {
                return Err(Error::invalid_config(
                    "microbatch strategy requires `event_time_start` or `event_time_end`",
                ));
            }
        }

        Ok(())
    }

    pub fn strategy(&self) -> IncrementalStrategy {
        self.incremental_strategy.unwrap_or_default()
    }

    pub fn hard_deletes(&self) -> HardDeletes {
        match self.hard_deletes {
            Some(hard_deletes) => hard_deletes,
            None if self.invalidate_hard_deletes => HardDeletes::Invalidate,
            None => HardDeletes::Ignore,
        }
    }

    /// The declared contract, in declaration order. Columns carrying a
    /// `not_null` constraint are marked non-nullable.
    pub fn contract_columns(&self) -> Result<Vec<Column>> {
        if self.columns.is_empty() {
            return Err(Error::invalid_config(
                "contract is enforced but no columns are declared",
            ));
        }

        self.columns
            .iter()
            .map(|(name, config)| {
                let Some(data_type) = &config.data_type else {
                    return Err(Error::invalid_config(format!(
                        "contract column `{name}` has no data_type"
                    )));
                };

                let column = Column::parse(name.clone(), data_type)?;
                let not_null = config
                    .constraints
                    .iter()
                    .any(|constraint| constraint.kind == ConstraintKind::NotNull);

                Ok(if not_null { column.not_null() } else { column })
            })
            .collect()
    }

    /// Snapshot strategy settings, validated.
    pub fn snapshot_settings(&self) -> Result<SnapshotSettings> {
        if self.unique_key.is_empty() {
            return Err(Error::invalid_config("snapshots require a `unique_key`"));
        }

        let strategy = match self.strategy {
            Some(SnapshotStrategy::Timestamp) => {
                let Some(updated_at) = &self.updated_at else {
                    return Err(Error::invalid_config(
                        "timestamp snapshots require `updated_at`",
                    ));
                };
                SnapshotStrategySettings::Timestamp {
                    updated_at: updated_at.clone(),
                }
            }
            Some(SnapshotStrategy::Check) => {
                let Some(check_cols) = &self.check_cols else {
                    return Err(Error::invalid_config(
                        "check snapshots require `check_cols`",
                    ));
                };
                if matches!(check_cols, CheckCols::Columns(columns) if columns.is_empty()) {
                    return Err(Error::invalid_config("`check_cols` must not be empty"));
                }
                SnapshotStrategySettings::Check {
                    check_cols: check_cols.clone(),
                    updated_at: self.updated_at.clone(),
                }
            }
            None => {
                return Err(Error::invalid_config(
                    "snapshots require a `strategy` (timestamp or check)",
                ))
            }
        };

        Ok(SnapshotSettings {
            unique_key: self.unique_key.clone(),
            strategy,
            hard_deletes: self.hard_deletes(),
        })
    }
}

/// Snapshot options after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSettings {
    pub unique_key: UniqueKey,
    pub strategy: SnapshotStrategySettings,
    pub hard_deletes: HardDeletes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStrategySettings {
    Timestamp {
        updated_at: String,
    },
    Check {
        check_cols: CheckCols,
        updated_at: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Vec<String> {
        match value {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config = ModelConfig::from_json(json!({})).unwrap();
        assert_eq!(config.materialized, Materialization::View);
        assert_eq!(config.strategy(), IncrementalStrategy::Default);
        assert_eq!(config.on_schema_change, OnSchemaChange::Ignore);
        assert_eq!(config.warn_if.to_string(), "!= 0");
        assert_eq!(config.error_if.to_string(), "!= 0");
        assert_eq!(config.hard_deletes(), HardDeletes::Ignore);
        assert!(config.unique_key.is_empty());
    }

    #[test]
    fn unique_key_accepts_string_or_list() {
        let config = ModelConfig::from_json(json!({ "unique_key": "id" })).unwrap();
        assert_eq!(config.unique_key.columns(), ["id"]);

        let config = ModelConfig::from_json(json!({ "unique_key": ["a", "b"] })).unwrap();
        assert_eq!(config.unique_key.columns(), ["a", "b"]);
    }

    #[test]
    fn unknown_strategy_fails_at_load() {
        let err = ModelConfig::from_json(json!({
            "materialized": "incremental",
            "incremental_strategy": "upsert",
        }))
        .unwrap_err();
        assert!(err.is_invalid_config());
        assert!(err.to_string().contains("upsert"));
    }

    #[test]
    fn strategies_parse_by_name() {
        for (name, strategy) in [
            ("default", IncrementalStrategy::Default),
            ("delete+insert", IncrementalStrategy::DeleteInsert),
            ("merge", IncrementalStrategy::Merge),
            ("microbatch", IncrementalStrategy::Microbatch),
            ("append", IncrementalStrategy::Append),
        ] {
            assert_eq!(name.parse::<IncrementalStrategy>().unwrap(), strategy);
            assert_eq!(strategy.as_str(), name);
        }
    }

    #[test]
    fn microbatch_requires_event_time_and_boundary() {
        let err = ModelConfig::from_json(json!({
            "materialized": "incremental",
            "incremental_strategy": "microbatch",
        }))
        .unwrap_err();
        assert!(err.is_invalid_config());

        let err = ModelConfig::from_json(json!({
            "materialized": "incremental",
            "incremental_strategy": "microbatch",
            "event_time": "created_at",
        }))
        .unwrap_err();
        assert!(err.is_invalid_config());

        ModelConfig::from_json(json!({
            "materialized": "incremental",
            "incremental_strategy": "microbatch",
            "event_time": "created_at",
            "event_time_start": "2024-01-01 00:00:00",
        }))
        .unwrap();
    }

    #[test]
    fn contract_columns_follow_declaration_order() {
        let config = ModelConfig::from_json(json!({
            "contract": { "enforced": true },
            "columns": {
                "id": { "data_type": "int", "constraints": [{ "type": "not_null" }] },
                "name": { "data_type": "varchar(50)" },
            },
        }))
        .unwrap();

        let columns = config.contract_columns().unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "id");
        assert!(!columns[0].nullable);
        assert_eq!(columns[1].data_type(), "varchar(50)");
        assert!(columns[1].nullable);
    }

    #[test]
    fn contract_columns_need_types() {
        let err = ModelConfig::from_json(json!({
            "contract": { "enforced": true },
            "columns": { "id": {} },
        }))
        .unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn snapshot_settings_are_validated() {
        let err = ModelConfig::from_json(json!({
            "materialized": "snapshot",
            "unique_key": "id",
            "strategy": "timestamp",
        }))
        .unwrap_err();
        assert!(err.is_invalid_config());

        let config = ModelConfig::from_json(json!({
            "materialized": "snapshot",
            "unique_key": "id",
            "strategy": "check",
            "check_cols": "all",
            "invalidate_hard_deletes": true,
        }))
        .unwrap();
        let settings = config.snapshot_settings().unwrap();
        assert_eq!(
            settings.strategy,
            SnapshotStrategySettings::Check {
                check_cols: CheckCols::All,
                updated_at: None
            }
        );
        assert_eq!(settings.hard_deletes, HardDeletes::Invalidate);
    }

    #[test]
    fn grants_accept_single_grantee() {
        let config = ModelConfig::from_json(json!({
            "grants": { "SELECT": "analyst", "insert": ["loader", "etl"] },
        }))
        .unwrap();
        let grants = config.grants.iter().collect::<Vec<_>>();
        assert_eq!(grants[0], ("select", &["analyst".to_string()][..]));
        assert_eq!(grants[1].1.len(), 2);
    }

    #[test]
    fn merge_column_lists_are_exclusive() {
        let err = ModelConfig::from_json(json!({
            "merge_update_columns": ["a"],
            "merge_exclude_columns": ["b"],
        }))
        .unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn severity_is_case_insensitive() {
        let config = ModelConfig::from_json(json!({ "severity": "WARN" })).unwrap();
        assert_eq!(config.severity, Severity::Warn);
    }

    #[test]
    fn adapter_config_resolves_dialect() {
        let config = AdapterConfig::from_json(json!({ "dialect": "ansi" })).unwrap();
        assert_eq!(config.dialect, Dialect::Ansi);
        assert!(AdapterConfig::from_json(json!({ "dialect": "oracle" }))
            .unwrap_err()
            .is_invalid_config());
    }
}
