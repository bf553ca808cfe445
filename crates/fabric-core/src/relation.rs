use crate::{Error, Result};
use siphasher::sip::SipHasher13;
use std::{fmt, hash::Hasher};

/// Longest identifier the warehouse accepts, in characters.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Length of the hex tag appended to derived identifiers.
const TAG_LEN: usize = 8;

/// Kind of object a relation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Table,
    View,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Table => "table",
            RelationKind::View => "view",
        }
    }

    /// Parses the kind reported by the catalog (`BASE TABLE`, `table`, `VIEW`, ...).
    pub fn from_catalog(kind: &str) -> Result<RelationKind> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "table" | "base table" => Ok(RelationKind::Table),
            "view" => Ok(RelationKind::View),
            other => Err(Error::invalid_result(format!(
                "unknown relation kind `{other}`"
            ))),
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of an adapter-owned relation derived from a model's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Derivation {
    /// Staging table built before it replaces or merges into the target.
    Temp,
    /// View wrapping model SQL so CTE-bearing queries can feed a table.
    TempView,
    /// The previous target, moved aside during a publish swap.
    Backup,
    /// Table rebuilt with a new column layout.
    Rebuild,
    /// View holding the snapshot staging query.
    StagingView,
}

impl Derivation {
    const ALL: [Derivation; 5] = [
        Derivation::TempView,
        Derivation::StagingView,
        Derivation::Temp,
        Derivation::Backup,
        Derivation::Rebuild,
    ];

    fn role(self) -> &'static str {
        match self {
            Derivation::Temp => "tmp",
            Derivation::TempView => "tmp_vw",
            Derivation::Backup => "backup",
            Derivation::Rebuild => "rebuild",
            Derivation::StagingView => "stg_vw",
        }
    }

    fn kind(self, original: RelationKind) -> RelationKind {
        match self {
            Derivation::Temp | Derivation::Rebuild => RelationKind::Table,
            Derivation::TempView | Derivation::StagingView => RelationKind::View,
            Derivation::Backup => original,
        }
    }
}

/// Identifies one adapter run. Derived relation names embed a hash of it so
/// concurrent runs never collide on scratch objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> RunId {
        RunId(id.into())
    }

    /// Creates a fresh, random run id.
    pub fn generate() -> RunId {
        RunId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully qualified warehouse object: `database.schema.identifier`.
///
/// Every part is always quoted when rendered; names are compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    database: String,
    schema: String,
    identifier: String,
    kind: RelationKind,
}

impl Relation {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        identifier: impl Into<String>,
        kind: RelationKind,
    ) -> Result<Relation> {
        let relation = Relation {
            database: database.into(),
            schema: schema.into(),
            identifier: identifier.into(),
            kind,
        };

        for (part, value) in [
            ("database", &relation.database),
            ("schema", &relation.schema),
            ("identifier", &relation.identifier),
        ] {
            validate_part(part, value)?;
        }

        Ok(relation)
    }

    pub fn table(
        database: impl Into<String>,
        schema: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Result<Relation> {
        Relation::new(database, schema, identifier, RelationKind::Table)
    }

    pub fn view(
        database: impl Into<String>,
        schema: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Result<Relation> {
        Relation::new(database, schema, identifier, RelationKind::View)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn is_table(&self) -> bool {
        self.kind == RelationKind::Table
    }

    pub fn is_view(&self) -> bool {
        self.kind == RelationKind::View
    }

    /// Same database, schema and identifier, regardless of kind.
    pub fn same_name(&self, other: &Relation) -> bool {
        self.database == other.database
            && self.schema == other.schema
            && self.identifier == other.identifier
    }

    /// Returns a copy naming `identifier` in the same schema.
    pub fn with_identifier(&self, identifier: impl Into<String>) -> Result<Relation> {
        let identifier = identifier.into();
        validate_part("identifier", &identifier)?;
        Ok(Relation {
            identifier,
            ..self.clone()
        })
    }

    /// Returns a copy whose identifier is this one followed by `suffix`.
    pub fn with_suffix(&self, suffix: &str) -> Result<Relation> {
        self.with_identifier(format!("{}{}", self.identifier, suffix))
    }

    /// Returns a copy in another schema of the same database.
    pub fn in_schema(&self, schema: impl Into<String>) -> Result<Relation> {
        let schema = schema.into();
        validate_part("schema", &schema)?;
        Ok(Relation {
            schema,
            ..self.clone()
        })
    }

    pub fn as_kind(&self, kind: RelationKind) -> Relation {
        Relation {
            kind,
            ..self.clone()
        }
    }

    pub fn as_backup(&self, run: &RunId) -> Relation {
        self.derive(Derivation::Backup, run)
    }

    pub fn as_temp(&self, run: &RunId) -> Relation {
        self.derive(Derivation::Temp, run)
    }

    pub fn as_temp_view(&self, run: &RunId) -> Relation {
        self.derive(Derivation::TempView, run)
    }

    pub fn as_rebuild(&self, run: &RunId) -> Relation {
        self.derive(Derivation::Rebuild, run)
    }

    pub fn as_staging_view(&self, run: &RunId) -> Relation {
        self.derive(Derivation::StagingView, run)
    }

    /// Derives an adapter-owned relation: `{identifier}__dbt_{role}_{tag}`.
    ///
    /// The tag hashes the full identifier together with the run id, so the
    /// name is stable within a run, distinct across runs, and distinct when
    /// deriving from an already derived relation. The base is shortened when
    /// needed to stay within [`MAX_IDENTIFIER_LENGTH`].
    pub fn derive(&self, derivation: Derivation, run: &RunId) -> Relation {
        let mut hasher = SipHasher13::new();
        hasher.write(self.identifier.as_bytes());
        hasher.write_u8(0xff);
        hasher.write(derivation.role().as_bytes());
        hasher.write_u8(0xff);
        hasher.write(run.as_str().as_bytes());
        let tag = format!("{:08x}", hasher.finish() as u32);

        let suffix = format!("__dbt_{}_{}", derivation.role(), tag);
        let room = MAX_IDENTIFIER_LENGTH - suffix.chars().count();
        let base: String = self.identifier.chars().take(room).collect();

        Relation {
            identifier: format!("{base}{suffix}"),
            kind: derivation.kind(self.kind),
            ..self.clone()
        }
    }

    /// Returns the derivation role when this relation's name was produced by
    /// [`Relation::derive`].
    pub fn derivation(&self) -> Option<Derivation> {
        let (rest, tag) = self.identifier.rsplit_once('_')?;
        if tag.len() != TAG_LEN || !tag.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        Derivation::ALL.into_iter().find(|derivation| {
            rest.strip_suffix(derivation.role())
                .and_then(|base| base.strip_suffix("__dbt_"))
                .is_some_and(|base| !base.is_empty())
        })
    }

    pub fn is_derived(&self) -> bool {
        self.derivation().is_some()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\".\"{}\".\"{}\"",
            self.database, self.schema, self.identifier
        )
    }
}

fn validate_part(part: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_relation(format!("{part} must not be empty")));
    }

    let len = value.chars().count();
    if len > MAX_IDENTIFIER_LENGTH {
        return Err(Error::invalid_relation(format!(
            "{part} `{value}` is {len} characters; the limit is {MAX_IDENTIFIER_LENGTH}"
        )));
    }

    if value.chars().any(char::is_control) {
        return Err(Error::invalid_relation(format!(
            "{part} `{}` contains control characters",
            value.escape_debug()
        )));
    }

    Ok(())
}
