use super::Statement;
use crate::Relation;

#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    pub relation: Relation,
    pub privilege: String,
    pub grantees: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Revoke {
    pub relation: Relation,
    pub privilege: String,
    pub grantees: Vec<String>,
}

impl Statement {
    pub fn grant(relation: &Relation, privilege: &str, grantees: Vec<String>) -> Statement {
        Grant {
            relation: relation.clone(),
            privilege: privilege.to_string(),
            grantees,
        }
        .into()
    }

    pub fn revoke(relation: &Relation, privilege: &str, grantees: Vec<String>) -> Statement {
        Revoke {
            relation: relation.clone(),
            privilege: privilege.to_string(),
            grantees,
        }
        .into()
    }
}

impl From<Grant> for Statement {
    fn from(value: Grant) -> Self {
        Self::Grant(value)
    }
}

impl From<Revoke> for Statement {
    fn from(value: Revoke) -> Self {
        Self::Revoke(value)
    }
}
