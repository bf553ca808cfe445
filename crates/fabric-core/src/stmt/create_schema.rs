use super::Statement;

/// Creates a schema unless it already exists.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSchema {
    pub database: String,
    pub schema: String,
}

impl Statement {
    pub fn create_schema(database: &str, schema: &str) -> Statement {
        CreateSchema {
            database: database.to_string(),
            schema: schema.to_string(),
        }
        .into()
    }
}

impl From<CreateSchema> for Statement {
    fn from(value: CreateSchema) -> Self {
        Self::CreateSchema(value)
    }
}
