use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tablemirror::MirrorConfig;
use tablemirror::pipeline::{DatasetSpec, Stage, default_datasets};

#[derive(Parser)]
#[command(name = "tablemirror")]
#[command(about = "Mirror JSON datasets into relational tables derived from their schemas")]
#[command(version)]
pub struct Cli {
    /// Relational backend to write into
    #[arg(long, value_enum, default_value_t = StoreKind::Postgres)]
    pub store: StoreKind,

    /// Dataset to process, as NAME or NAME:PATH (repeatable, defaults to
    /// launches, payloads and capsules)
    #[arg(long = "dataset", value_name = "NAME[:PATH]")]
    pub datasets: Vec<DatasetSpec>,

    /// Overrides MIRROR_DATA_DIR
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Overrides MIRROR_SCHEMA_DIR
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Copy)]
pub enum Command {
    /// Download data and schema files
    Fetch,
    /// Create tables from the saved schema files
    Provision,
    /// Load the saved data files
    Load,
    /// Fetch, provision and load
    Run,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl Cli {
    pub fn stage(&self) -> Stage {
        match self.command {
            Command::Fetch => Stage::Fetch,
            Command::Provision => Stage::Provision,
            Command::Load => Stage::Load,
            Command::Run => Stage::All,
        }
    }

    pub fn datasets(&self) -> Vec<DatasetSpec> {
        if self.datasets.is_empty() {
            default_datasets()
        } else {
            self.datasets.clone()
        }
    }

    pub fn apply(&self, config: &mut MirrorConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.schema_dir {
            config.schema_dir = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["tablemirror", "run"]).unwrap();
        assert_eq!(cli.store, StoreKind::Postgres);
        assert_eq!(cli.stage(), Stage::All);
        assert_eq!(cli.datasets(), default_datasets());
    }

    #[test]
    fn test_parse_datasets_and_store() {
        let cli = Cli::try_parse_from([
            "tablemirror",
            "--store",
            "memory",
            "--dataset",
            "cores",
            "--dataset",
            "ships:v4/ships",
            "--data-dir",
            "/tmp/data",
            "load",
        ])
        .unwrap();

        assert_eq!(cli.store, StoreKind::Memory);
        assert_eq!(cli.stage(), Stage::Load);
        assert_eq!(
            cli.datasets(),
            vec![DatasetSpec::named("cores"), DatasetSpec::new("ships", "v4/ships")]
        );

        let mut config = MirrorConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/data"));
        assert_eq!(config.schema_dir, PathBuf::from("schema"));
    }

    #[test]
    fn test_parse_rejects_bad_dataset() {
        assert!(Cli::try_parse_from(["tablemirror", "--dataset", "a b", "run"]).is_err());
        assert!(Cli::try_parse_from(["tablemirror"]).is_err());
    }
}
