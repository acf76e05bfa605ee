// photoprep/src/core/processor.rs
use super::{Action, ProcessingStats, Result, SweepConfig};
use crate::processors::{
    BackupOutcome, BackupStripper, BatchProcessor, CatalogBuilder, CatalogOutcome, RawConverter,
    RawDecoder,
};

#[derive(Debug)]
pub enum ActionReport {
    Compressed(ProcessingStats),
    Resized(ProcessingStats),
    Cataloged(CatalogOutcome),
}

#[derive(Debug)]
pub struct RunReport {
    pub raw_conversion: ProcessingStats,
    pub backup: BackupOutcome,
    pub action: ActionReport,
}

impl RunReport {
    /// Every per-file stats block produced by the run, in execution order.
    pub fn all_stats(&self) -> Vec<(&'static str, &ProcessingStats)> {
        let mut all = vec![("raw conversion", &self.raw_conversion)];
        if let Some(stats) = self.backup.stats() {
            all.push(("backup", stats));
        }
        match &self.action {
            ActionReport::Compressed(stats) => all.push(("compress", stats)),
            ActionReport::Resized(stats) => all.push(("resize", stats)),
            ActionReport::Cataloged(outcome) => {
                all.push(("catalog raw conversion", &outcome.raw_conversion));
                all.push(("catalog", &outcome.entries));
            }
        }
        all
    }

    pub fn has_failures(&self) -> bool {
        self.all_stats().iter().any(|(_, stats)| stats.has_failures())
    }

    pub fn failure_count(&self) -> usize {
        self.all_stats()
            .iter()
            .map(|(_, stats)| stats.errors.len())
            .sum()
    }
}

/// Runs raw conversion, backup-and-strip, then the configured action on one
/// folder.
pub struct FolderProcessor {
    config: SweepConfig,
    raw_converter: RawConverter,
}

impl FolderProcessor {
    pub fn new(config: SweepConfig) -> Self {
        let raw_converter = RawConverter::new(&config);
        Self {
            config,
            raw_converter,
        }
    }

    pub fn with_raw_decoder(mut self, decoder: Box<dyn RawDecoder>) -> Self {
        self.raw_converter = self.raw_converter.with_decoder(decoder);
        self
    }

    pub fn run(&self) -> Result<RunReport> {
        self.config.validate()?;

        log::info!(
            "Processing {} ({})",
            self.config.folder.display(),
            self.config.action.name()
        );

        let raw_conversion = self.raw_converter.convert_missing()?;
        let backup = BackupStripper::new(&self.config).run()?;

        let action = match self.config.action {
            Action::Compress { quality } => {
                ActionReport::Compressed(BatchProcessor::new(&self.config).compress(quality)?)
            }
            Action::Resize { percent } => {
                ActionReport::Resized(BatchProcessor::new(&self.config).resize(percent)?)
            }
            Action::Info => ActionReport::Cataloged(
                CatalogBuilder::new(&self.config).build(&self.raw_converter)?,
            ),
        };

        Ok(RunReport {
            raw_conversion,
            backup,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SweepError;
    use crate::test_helpers::{read_table, sample_fields, write_jpeg};
    use tempfile::TempDir;

    #[test]
    fn test_run_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let processor = FolderProcessor::new(SweepConfig::new(
            temp_dir.path(),
            Action::Compress { quality: 0 },
        ));

        assert!(matches!(processor.run(), Err(SweepError::InvalidParameter(_))));
        assert!(!temp_dir.path().join("Original").exists());
    }

    #[test]
    fn test_compress_run_backs_up_first() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_jpeg(&root.join("a.jpg"), 16, 16, sample_fields(None, true));

        let report = FolderProcessor::new(SweepConfig::new(root, Action::Compress { quality: 40 }))
            .run()
            .unwrap();

        assert!(matches!(report.backup, BackupOutcome::Completed(_)));
        assert!(!report.has_failures());
        assert_eq!(report.failure_count(), 0);
        assert!(read_table(&root.join("Original/a.jpg")).has_location());
        assert!(!read_table(&root.join("a.jpg")).has_location());
        assert!(!read_table(&root.join("thumbs/a.jpg")).has_location());
    }

    #[test]
    fn test_failures_are_counted_across_steps() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("junk.cr2"), b"not raw").unwrap();
        std::fs::write(root.join("junk2.jpg"), b"not jpeg").unwrap();

        let report = FolderProcessor::new(SweepConfig::new(root, Action::Resize { percent: 50 }))
            .run()
            .unwrap();

        // raw decode fails once, the broken jpeg fails in backup
        assert_eq!(report.raw_conversion.errors.len(), 1);
        assert!(report.backup.stats().unwrap().has_failures());
        assert!(report.has_failures());
        assert_eq!(report.failure_count(), 2);
    }
}
