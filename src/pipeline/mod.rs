//! Dataset pipeline
//!
//! Drives fetch, provision and load for a list of datasets. Datasets are
//! independent: a failure is logged with the dataset name, recorded in the
//! [`BatchReport`], and the run moves on to the next one.

mod dataset;

pub use dataset::{DatasetSpec, Stage, default_datasets};

use crate::config::MirrorConfig;
use crate::core::Result;
use crate::facade::Mirror;
use crate::source::{SourceFetcher, extract_json_block, files};
use crate::store::RelationalStore;
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of a multi-dataset run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    /// Dataset name and error message.
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// True when there was work to do and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failed.is_empty()
    }
}

pub struct Pipeline {
    config: MirrorConfig,
    fetcher: Arc<dyn SourceFetcher>,
    mirror: Mirror,
}

impl Pipeline {
    pub fn new(
        config: MirrorConfig,
        fetcher: Arc<dyn SourceFetcher>,
        store: Arc<dyn RelationalStore>,
    ) -> Self {
        let mirror = Mirror::with_options(store, config.ddl.clone(), config.loader.clone());
        Self {
            config,
            fetcher,
            mirror,
        }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    /// Download the dataset's records and schema block into the data and
    /// schema directories.
    pub async fn fetch_dataset(&self, dataset: &DatasetSpec) -> Result<()> {
        let url = self.config.data_url(&dataset.source_path);
        let body = self.fetcher.fetch_text(&url).await?;
        let records: serde_json::Value = serde_json::from_str(&body)?;
        files::write_json(
            files::data_path(&self.config.data_dir, &dataset.table_name),
            &records,
        )?;

        let url = self.config.schema_url(&dataset.table_name);
        let markdown = self.fetcher.fetch_text(&url).await?;
        let schema = extract_json_block(&markdown)?;
        files::write_json(
            files::schema_path(&self.config.schema_dir, &dataset.table_name),
            &schema,
        )?;

        Ok(())
    }

    pub async fn provision_dataset(&self, dataset: &DatasetSpec) -> Result<()> {
        let path = files::schema_path(&self.config.schema_dir, &dataset.table_name);
        self.mirror.provision_file(&dataset.table_name, path).await?;
        Ok(())
    }

    pub async fn load_dataset(&self, dataset: &DatasetSpec) -> Result<u64> {
        let path = files::data_path(&self.config.data_dir, &dataset.table_name);
        self.mirror.load_file(&dataset.table_name, path).await
    }

    pub async fn run_dataset(&self, dataset: &DatasetSpec, stage: Stage) -> Result<()> {
        if matches!(stage, Stage::Fetch | Stage::All) {
            self.fetch_dataset(dataset).await?;
        }
        if matches!(stage, Stage::Provision | Stage::All) {
            self.provision_dataset(dataset).await?;
        }
        if matches!(stage, Stage::Load | Stage::All) {
            self.load_dataset(dataset).await?;
        }
        Ok(())
    }

    pub async fn run_all(&self, datasets: &[DatasetSpec], stage: Stage) -> BatchReport {
        let mut report = BatchReport::default();

        for dataset in datasets {
            match self.run_dataset(dataset, stage).await {
                Ok(()) => {
                    info!(dataset = %dataset.table_name, %stage, "Dataset complete");
                    report.succeeded.push(dataset.table_name.clone());
                }
                Err(err) => {
                    error!(dataset = %dataset.table_name, %stage, error = %err, "Dataset failed");
                    report
                        .failed
                        .push((dataset.table_name.clone(), err.to_string()));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_outcomes() {
        let mut report = BatchReport::default();
        assert!(report.is_success());
        assert!(!report.all_failed());

        report.failed.push(("launches".into(), "boom".into()));
        assert!(report.all_failed());

        report.succeeded.push("capsules".into());
        assert!(!report.all_failed());
        assert!(!report.is_success());
    }
}
