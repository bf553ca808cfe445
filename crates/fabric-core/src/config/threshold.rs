use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

/// A test threshold such as `!= 0` or `>= 10`, applied to the failure count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Threshold {
    pub comparison: Comparison,
    pub value: u64,
}

impl Threshold {
    pub fn new(comparison: Comparison, value: u64) -> Threshold {
        Threshold { comparison, value }
    }

    /// Evaluates the threshold against a failure count.
    pub fn matches(&self, count: u64) -> bool {
        match self.comparison {
            Comparison::Eq => count == self.value,
            Comparison::Ne => count != self.value,
            Comparison::Lt => count < self.value,
            Comparison::Le => count <= self.value,
            Comparison::Gt => count > self.value,
            Comparison::Ge => count >= self.value,
        }
    }
}

impl Default for Threshold {
    fn default() -> Threshold {
        Threshold::new(Comparison::Ne, 0)
    }
}

impl FromStr for Threshold {
    type Err = Error;

    fn from_str(input: &str) -> Result<Threshold> {
        let trimmed = input.trim();

        let (comparison, rest) = [
            ("!=", Comparison::Ne),
            ("<>", Comparison::Ne),
            (">=", Comparison::Ge),
            ("<=", Comparison::Le),
            ("==", Comparison::Eq),
            ("=", Comparison::Eq),
            (">", Comparison::Gt),
            ("<", Comparison::Lt),
        ]
        .into_iter()
        .find_map(|(token, comparison)| {
            trimmed
                .strip_prefix(token)
                .map(|rest| (comparison, rest.trim()))
        })
        .ok_or_else(|| Error::invalid_config(format!("threshold `{input}` has no comparison")))?;

        let value = rest
            .parse()
            .map_err(|_| Error::invalid_config(format!("threshold `{input}` has no count")))?;

        Ok(Threshold { comparison, value })
    }
}

impl TryFrom<String> for Threshold {
    type Error = Error;

    fn try_from(input: String) -> Result<Threshold> {
        input.parse()
    }
}

impl From<Threshold> for String {
    fn from(threshold: Threshold) -> String {
        threshold.to_string()
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.comparison.as_str(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_forms() {
        assert_eq!("!= 0".parse::<Threshold>().unwrap(), Threshold::default());
        assert_eq!(
            "<>0".parse::<Threshold>().unwrap(),
            Threshold::new(Comparison::Ne, 0)
        );
        assert_eq!(
            ">=10".parse::<Threshold>().unwrap(),
            Threshold::new(Comparison::Ge, 10)
        );
        assert_eq!(
            " > 5 ".parse::<Threshold>().unwrap(),
            Threshold::new(Comparison::Gt, 5)
        );
        assert_eq!(
            "=3".parse::<Threshold>().unwrap(),
            Threshold::new(Comparison::Eq, 3)
        );
    }

    #[test]
    fn rejects_malformed() {
        assert!("10".parse::<Threshold>().unwrap_err().is_invalid_config());
        assert!(">= ten".parse::<Threshold>().unwrap_err().is_invalid_config());
    }

    #[test]
    fn evaluates_counts() {
        let threshold: Threshold = ">10".parse().unwrap();
        assert!(!threshold.matches(10));
        assert!(threshold.matches(11));
        assert!(Threshold::default().matches(1));
        assert!(!Threshold::default().matches(0));
    }
}
