//! Batch driver: rename every purchase order in a directory and write an
//! annotated copy of each.

use std::collections::HashSet;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{PorderError, Result};
use crate::models::config::PorderConfig;
use crate::models::order::{FileReport, OrderFields, RenameOutcome};
use crate::order::{candidate_filename, OrderParser};
use crate::pdf::{PdfExtractor, PdfProcessor};
use crate::session::DocumentSession;

/// A file that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    /// Name of the file in the input directory.
    pub file_name: String,

    /// What went wrong.
    pub error: String,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Files that went through the pipeline, in processing order.
    pub reports: Vec<FileReport>,

    /// Files skipped because they could not be read or written.
    pub failures: Vec<FileFailure>,

    /// Wall-clock time for the batch in milliseconds.
    pub elapsed_ms: u64,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.reports.len() + self.failures.len()
    }

    pub fn renamed(&self) -> usize {
        self.count(|r| matches!(r, RenameOutcome::Renamed { .. }))
    }

    pub fn missing_fields(&self) -> usize {
        self.count(|r| matches!(r, RenameOutcome::MissingFields { .. }))
    }

    pub fn collisions(&self) -> usize {
        self.count(|r| matches!(r, RenameOutcome::Collision { .. }))
    }

    /// Files whose annotated copy could not be written.
    pub fn unsaved(&self) -> usize {
        self.reports.iter().filter(|r| r.save_error.is_some()).count()
    }

    fn count(&self, pred: impl Fn(&RenameOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.rename)).count()
    }
}

/// Sequential batch processor over one input directory.
pub struct BatchProcessor<P: PdfProcessor + Default = PdfExtractor> {
    config: PorderConfig,
    parser: OrderParser,
    dry_run: bool,
    /// Names handed out during a dry run, which never reach the disk.
    planned: HashSet<PathBuf>,
    _processor: PhantomData<P>,
}

impl<P: PdfProcessor + Default> BatchProcessor<P> {
    pub fn new(config: PorderConfig) -> Self {
        Self {
            config,
            parser: OrderParser::new(),
            dry_run: false,
            planned: HashSet::new(),
            _processor: PhantomData,
        }
    }

    /// Decide and report everything without touching the filesystem.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &PorderConfig {
        &self.config
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Create the output directory.
    pub fn prepare(&self) -> Result<()> {
        if !self.dry_run {
            fs::create_dir_all(&self.config.output_dir)?;
        }
        Ok(())
    }

    /// Snapshot of the PDF files in the input directory.
    ///
    /// Listed once up front so files renamed during the run are not visited
    /// again. Not recursive; listing order is kept.
    pub fn list_inputs(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.config.input_dir;
        let entries = fs::read_dir(dir).map_err(|e| {
            PorderError::Config(format!("cannot read input directory {}: {}", dir.display(), e))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_pdf = path
                .file_name()
                .map(|name| name.to_string_lossy().to_lowercase().ends_with(".pdf"))
                .unwrap_or(false);
            if is_pdf && path.is_file() {
                files.push(path);
            }
        }

        debug!("Found {} PDF files in {}", files.len(), dir.display());
        Ok(files)
    }

    /// Run the pipeline on one file.
    pub fn process_file(&mut self, path: &Path) -> Result<FileReport> {
        let start = Instant::now();
        let zone = self.config.zone;
        let mut warnings = Vec::new();

        let mut session = DocumentSession::<P>::open(path)?;
        let original_name = session.file_name();

        let text = match session.full_text() {
            Ok(text) => text,
            Err(e) => {
                warn!("{}: {}", original_name, e);
                warnings.push(format!("full text unavailable: {}", e));
                String::new()
            }
        };
        let fields = self
            .parser
            .parse(&text)
            .with_supplier(&session.zone_text(&zone)?);

        let rename = self.decide_rename(&mut session, &fields)?;
        match &rename {
            RenameOutcome::MissingFields { missing } => {
                let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
                warn!("{}: missing {}, name kept", original_name, names.join(", "));
            }
            RenameOutcome::Collision { candidate } => {
                warn!("{}: {} already exists, name kept", original_name, candidate);
            }
            RenameOutcome::Renamed { .. } => {}
        }

        let mut save_error = None;
        let (zone_text, output_path) = if self.dry_run {
            let name = match &rename {
                RenameOutcome::Renamed { to, .. } => to.clone(),
                _ => original_name.clone(),
            };
            (fields.supplier.clone(), Some(self.config.output_dir.join(name)))
        } else {
            let zone_text = match session.zone_text(&zone) {
                Ok(text) => Some(text),
                Err(e) => {
                    warnings.push(format!("zone re-read failed: {}", e));
                    None
                }
            };
            // The rename is already on disk; a failed copy must not hide it.
            let output = match session.annotate_and_save(
                &zone,
                &self.config.annotation,
                &self.config.output_dir,
            ) {
                Ok(output) => Some(output),
                Err(e) => {
                    warn!("{}: annotated copy not written: {}", session.file_name(), e);
                    save_error = Some(e.to_string());
                    None
                }
            };
            (zone_text, output)
        };

        Ok(FileReport {
            original_name,
            final_name: session.file_name(),
            fields,
            rename,
            zone_text,
            output_path,
            save_error,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn decide_rename(
        &mut self,
        session: &mut DocumentSession<P>,
        fields: &OrderFields,
    ) -> Result<RenameOutcome> {
        let Some(candidate) = candidate_filename(fields) else {
            return Ok(RenameOutcome::MissingFields {
                missing: fields.missing(),
            });
        };

        let target = session.path().with_file_name(&candidate);
        if target.exists() || self.planned.contains(&target) {
            return Ok(RenameOutcome::Collision { candidate });
        }

        let from = session.file_name();
        if self.dry_run {
            self.planned.insert(target);
        } else {
            session.rename_to(&candidate)?;
        }
        Ok(RenameOutcome::Renamed {
            from,
            to: candidate,
        })
    }

    /// Create the output directory and snapshot the inputs.
    pub fn prepare_inputs(&self) -> Result<Vec<PathBuf>> {
        self.prepare()?;
        self.list_inputs()
    }

    /// Process every input file, skipping the ones that fail.
    pub fn run(&mut self) -> Result<BatchSummary> {
        self.run_with(|_, _| {})
    }

    /// Like [`run`](Self::run), calling `on_file` after each file.
    pub fn run_with<F>(&mut self, on_file: F) -> Result<BatchSummary>
    where
        F: FnMut(&Path, std::result::Result<&FileReport, &FileFailure>),
    {
        let inputs = self.prepare_inputs()?;
        Ok(self.run_inputs(inputs, on_file))
    }

    /// Process exactly `inputs`, as returned by
    /// [`prepare_inputs`](Self::prepare_inputs), calling `on_file` after each.
    pub fn run_inputs<F>(&mut self, inputs: Vec<PathBuf>, mut on_file: F) -> BatchSummary
    where
        F: FnMut(&Path, std::result::Result<&FileReport, &FileFailure>),
    {
        let start = Instant::now();
        info!(
            "Processing {} files from {}",
            inputs.len(),
            self.config.input_dir.display()
        );

        let mut summary = BatchSummary::default();
        for path in inputs {
            match self.process_file(&path) {
                Ok(report) => {
                    on_file(&path, Ok(&report));
                    summary.reports.push(report);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    let failure = FileFailure {
                        file_name: path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        error: e.to_string(),
                    };
                    on_file(&path, Err(&failure));
                    summary.failures.push(failure);
                }
            }
        }

        summary.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            "Batch done: {} renamed, {} failed, {} copies not written in {}ms",
            summary.renamed(),
            summary.failures.len(),
            summary.unsaved(),
            summary.elapsed_ms
        );
        summary
    }
}
