use crate::{Error, Result};
use std::fmt;

/// Default (and maximum) `varchar` length on the warehouse.
pub const MAX_VARCHAR_SIZE: u32 = 8000;

/// A column as reported by the catalog or declared by a model contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,

    /// Base type name without modifiers, e.g. `varchar` or `decimal`.
    pub dtype: String,

    pub char_size: Option<u32>,

    pub numeric_precision: Option<u32>,

    pub numeric_scale: Option<u32>,

    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: impl Into<String>) -> Column {
        Column {
            name: name.into(),
            dtype: dtype.into(),
            char_size: None,
            numeric_precision: None,
            numeric_scale: None,
            nullable: true,
        }
    }

    /// Builds a column from a declared data type such as `varchar(100)`,
    /// `decimal(18, 2)` or a generic label like `string`.
    pub fn parse(name: impl Into<String>, data_type: &str) -> Result<Column> {
        let translated = translate_type(data_type);
        let data_type = translated.trim();

        let (base, args) = match data_type.split_once('(') {
            Some((base, rest)) => {
                let Some(args) = rest.trim_end().strip_suffix(')') else {
                    return Err(Error::invalid_config(format!(
                        "malformed data type `{data_type}`"
                    )));
                };
                (base.trim(), Some(args))
            }
            None => (data_type, None),
        };

        if base.is_empty() {
            return Err(Error::invalid_config("data type must not be empty"));
        }

        let mut column = Column::new(name, base.to_ascii_lowercase());

        if let Some(args) = args {
            let args = args
                .split(',')
                .map(str::trim)
                .filter(|arg| !arg.is_empty())
                .collect::<Vec<_>>();

            if column.is_string()
                || matches!(
                    column.dtype.as_str(),
                    "nvarchar" | "nchar" | "varbinary" | "binary"
                )
            {
                column.char_size = match args.first() {
                    Some(size) if size.eq_ignore_ascii_case("max") => None,
                    Some(size) => Some(size.parse()?),
                    None => None,
                };
            } else if column.is_numeric() || column.is_float() {
                column.numeric_precision = args.first().map(|p| p.parse()).transpose()?;
                column.numeric_scale = args.get(1).map(|s| s.parse()).transpose()?;
            }
        }

        Ok(column)
    }

    pub fn not_null(mut self) -> Column {
        self.nullable = false;
        self
    }

    pub fn with_char_size(mut self, size: u32) -> Column {
        self.char_size = Some(size);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: u32) -> Column {
        self.numeric_precision = Some(precision);
        self.numeric_scale = Some(scale);
        self
    }

    /// The full type as the warehouse spells it.
    pub fn data_type(&self) -> String {
        let dtype = self.dtype.to_ascii_lowercase();

        if dtype == "datetime2" {
            "datetime2(6)".to_string()
        } else if self.is_string() {
            string_type(i64::from(self.char_size.unwrap_or(0)))
        } else if matches!(dtype.as_str(), "decimal" | "numeric") {
            match (self.numeric_precision, self.numeric_scale) {
                (Some(precision), Some(scale)) => format!("decimal({precision},{scale})"),
                (Some(precision), None) => format!("decimal({precision},0)"),
                _ => "decimal".to_string(),
            }
        } else {
            self.dtype.clone()
        }
    }

    /// Only `varchar` and `char` count; national types are not widened.
    pub fn is_string(&self) -> bool {
        matches!(self.dtype.to_ascii_lowercase().as_str(), "varchar" | "char")
    }

    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_numeric() || self.is_float()
    }

    pub fn is_float(&self) -> bool {
        matches!(self.dtype.to_ascii_lowercase().as_str(), "float" | "real")
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.dtype.to_ascii_lowercase().as_str(),
            "int" | "integer" | "bigint" | "smallint" | "tinyint"
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.dtype.to_ascii_lowercase().as_str(),
            "decimal" | "numeric" | "money" | "smallmoney"
        )
    }

    pub fn string_size(&self) -> Result<u32> {
        if !self.is_string() {
            return Err(Error::invalid_config(format!(
                "column `{}` of type {} has no string size",
                self.name, self.dtype
            )));
        }
        Ok(self.char_size.unwrap_or(MAX_VARCHAR_SIZE))
    }

    /// A string column can widen into a strictly larger string column.
    pub fn can_expand_to(&self, other: &Column) -> bool {
        match (self.string_size(), other.string_size()) {
            (Ok(from), Ok(to)) => to > from,
            _ => false,
        }
    }

    pub fn literal(&self, value: &str) -> String {
        format!("cast('{}' as {})", value.replace('\'', "''"), self.data_type())
    }

    /// Two columns hold the same type when their rendered types agree.
    pub fn same_type(&self, other: &Column) -> bool {
        self.data_type().eq_ignore_ascii_case(&other.data_type())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type())
    }
}

/// `varchar(n)`, falling back to the maximum size for `n <= 0`.
pub fn string_type(size: i64) -> String {
    if size > 0 {
        format!("varchar({size})")
    } else {
        format!("varchar({MAX_VARCHAR_SIZE})")
    }
}

/// Maps a generic type label to the warehouse type. Labels are matched
/// case-insensitively; anything else passes through unchanged.
pub fn type_label(label: &str) -> Option<&'static str> {
    let label = match label.to_ascii_uppercase().as_str() {
        "STRING" | "VARCHAR" => "VARCHAR(8000)",
        "CHAR" => "CHAR(1)",
        "NCHAR" => "NCHAR(1)",
        "NVARCHAR" => "NVARCHAR(4000)",
        "TIMESTAMP" | "DATETIME2" => "DATETIME2(6)",
        "DATE" => "DATE",
        "TIME" => "TIME(6)",
        "FLOAT" => "FLOAT",
        "REAL" => "REAL",
        "INT" => "INT",
        "INTEGER" => "INT",
        "BIGINT" => "BIGINT",
        "SMALLINT" => "SMALLINT",
        "TINYINT" => "TINYINT",
        "BIT" | "BOOLEAN" => "BIT",
        "DECIMAL" => "DECIMAL",
        "NUMERIC" => "NUMERIC",
        "MONEY" => "MONEY",
        "SMALLMONEY" => "SMALLMONEY",
        "UNIQUEIDENTIFIER" => "UNIQUEIDENTIFIER",
        "VARBINARY" => "VARBINARY(8000)",
        "BINARY" => "BINARY(1)",
        _ => return None,
    };
    Some(label)
}

/// Translates a declared type, resolving bare labels through [`type_label`].
pub fn translate_type(data_type: &str) -> String {
    type_label(data_type.trim())
        .map(str::to_string)
        .unwrap_or_else(|| data_type.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn datetime2_always_renders_microseconds() {
        assert_eq!(Column::new("c", "datetime2").data_type(), "datetime2(6)");
        assert_eq!(Column::new("c", "DATETIME2").data_type(), "datetime2(6)");
    }

    #[test]
    fn strings_render_as_sized_varchar() {
        assert_eq!(
            Column::new("c", "varchar").with_char_size(255).data_type(),
            "varchar(255)"
        );
        assert_eq!(
            Column::new("c", "char").with_char_size(10).data_type(),
            "varchar(10)"
        );
        assert_eq!(Column::new("c", "varchar").data_type(), "varchar(8000)");
        assert_eq!(string_type(0), "varchar(8000)");
        assert_eq!(string_type(-1), "varchar(8000)");
        assert_eq!(string_type(100), "varchar(100)");
    }

    #[test]
    fn numerics_render_as_decimal() {
        assert_eq!(
            Column::new("c", "numeric").with_precision(10, 2).data_type(),
            "decimal(10,2)"
        );
        assert_eq!(
            Column::new("c", "uniqueidentifier").data_type(),
            "uniqueidentifier"
        );
    }

    #[test]
    fn type_predicates() {
        assert!(Column::new("c", "char").is_string());
        assert!(!Column::new("c", "nvarchar").is_string());
        assert!(Column::new("c", "real").is_float());
        assert!(Column::new("c", "tinyint").is_integer());
        assert!(Column::new("c", "smallmoney").is_numeric());
        assert!(Column::new("c", "decimal").is_number());
        assert!(!Column::new("c", "varchar").is_number());
    }

    #[test]
    fn string_size_requires_string() {
        assert_eq!(
            Column::new("c", "varchar").with_char_size(100).string_size().unwrap(),
            100
        );
        assert_eq!(Column::new("c", "varchar").string_size().unwrap(), 8000);
        assert!(Column::new("c", "int").string_size().is_err());
    }

    #[test]
    fn expansion_is_strictly_larger_strings() {
        let small = Column::new("a", "varchar").with_char_size(100);
        let large = Column::new("b", "varchar").with_char_size(200);
        assert!(small.can_expand_to(&large));
        assert!(!large.can_expand_to(&small));
        assert!(!small.can_expand_to(&small.clone()));
        assert!(!Column::new("a", "int").can_expand_to(&large));
        assert!(!small.can_expand_to(&Column::new("b", "int")));
    }

    #[test]
    fn literals_cast_to_rendered_type() {
        assert_eq!(
            Column::new("c", "varchar").with_char_size(100).literal("test_value"),
            "cast('test_value' as varchar(100))"
        );
        assert_eq!(Column::new("c", "int").literal("42"), "cast('42' as int)");
        assert_eq!(
            Column::new("c", "datetime2").literal("2024-01-01"),
            "cast('2024-01-01' as datetime2(6))"
        );
        assert_eq!(
            Column::new("c", "varchar").literal("it's"),
            "cast('it''s' as varchar(8000))"
        );
    }

    #[test]
    fn parse_declared_types() {
        let column = Column::parse("name", "varchar(100)").unwrap();
        assert_eq!(column.dtype, "varchar");
        assert_eq!(column.char_size, Some(100));

        let column = Column::parse("amount", "DECIMAL(18, 2)").unwrap();
        assert_eq!(column.data_type(), "decimal(18,2)");

        let column = Column::parse("label", "string").unwrap();
        assert_eq!(column.data_type(), "varchar(8000)");

        let column = Column::parse("at", "timestamp").unwrap();
        assert_eq!(column.data_type(), "datetime2(6)");

        let column = Column::parse("flag", "boolean").unwrap();
        assert_eq!(column.data_type(), "bit");

        assert!(Column::parse("x", "varchar(10").is_err());
        assert!(Column::parse("x", "").is_err());
    }

    #[test]
    fn labels_cover_common_types() {
        for label in [
            "STRING", "VARCHAR", "CHAR", "NCHAR", "NVARCHAR", "TIMESTAMP", "DATETIME2", "DATE",
            "TIME", "FLOAT", "REAL", "INT", "INTEGER", "BIGINT", "SMALLINT", "TINYINT", "BIT",
            "BOOLEAN", "DECIMAL", "NUMERIC", "MONEY", "SMALLMONEY", "UNIQUEIDENTIFIER",
            "VARBINARY", "BINARY",
        ] {
            assert!(type_label(label).is_some(), "{label}");
        }
        assert_eq!(type_label("string"), Some("VARCHAR(8000)"));
        assert_eq!(type_label("geography"), None);
    }
}
