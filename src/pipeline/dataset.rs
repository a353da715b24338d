use crate::core::{MirrorError, Result};
use std::fmt;
use std::str::FromStr;

/// One upstream dataset and the table it is mirrored into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    pub table_name: String,
    /// Path below the API base URL.
    pub source_path: String,
}

impl DatasetSpec {
    pub fn new(table_name: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            source_path: source_path.into(),
        }
    }

    /// Dataset whose source path equals its table name.
    pub fn named(table_name: &str) -> Self {
        Self::new(table_name, table_name)
    }
}

pub fn default_datasets() -> Vec<DatasetSpec> {
    ["launches", "payloads", "capsules"]
        .into_iter()
        .map(DatasetSpec::named)
        .collect()
}

/// Parses `NAME` or `NAME:PATH`.
impl FromStr for DatasetSpec {
    type Err = MirrorError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, path) = match s.split_once(':') {
            Some((name, path)) => (name.trim(), path.trim()),
            None => (s.trim(), s.trim()),
        };

        if name.is_empty() || path.is_empty() {
            return Err(MirrorError::Config(format!(
                "Invalid dataset '{}', expected NAME or NAME:PATH",
                s
            )));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(MirrorError::Config(format!(
                "Dataset name '{}' may only contain letters, digits and underscores",
                name
            )));
        }

        Ok(Self::new(name, path))
    }
}

impl fmt::Display for DatasetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table_name == self.source_path {
            write!(f, "{}", self.table_name)
        } else {
            write!(f, "{}:{}", self.table_name, self.source_path)
        }
    }
}

/// How far to take each dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Download data and schema files.
    Fetch,
    /// Create tables from the schema files.
    Provision,
    /// Load the data files into their tables.
    Load,
    /// Fetch, provision and load.
    All,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Provision => "provision",
            Stage::Load => "load",
            Stage::All => "run",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dataset() {
        assert_eq!(
            "cores:v4/cores".parse::<DatasetSpec>().unwrap(),
            DatasetSpec::new("cores", "v4/cores")
        );
        assert_eq!(
            "rockets".parse::<DatasetSpec>().unwrap(),
            DatasetSpec::named("rockets")
        );
    }

    #[test]
    fn test_parse_rejects_bad_names() {
        assert!("".parse::<DatasetSpec>().is_err());
        assert!("name:".parse::<DatasetSpec>().is_err());
        assert!("drop table;:x".parse::<DatasetSpec>().is_err());
        assert!("../etc:passwd".parse::<DatasetSpec>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for spec in ["launches", "ships:v4/ships"] {
            assert_eq!(spec.parse::<DatasetSpec>().unwrap().to_string(), spec);
        }
    }

    #[test]
    fn test_default_datasets() {
        let names: Vec<String> = default_datasets()
            .into_iter()
            .map(|d| d.table_name)
            .collect();
        assert_eq!(names, vec!["launches", "payloads", "capsules"]);
    }
}
