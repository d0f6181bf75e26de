//! Batch command: rename and annotate every purchase order in a directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::debug;

use porder_core::{
    BatchProcessor, BatchSummary, CaptureZone, FileFailure, FileReport, PdfExtractor,
    PorderConfig, RenameOutcome,
};

/// Arguments for the batch command.
#[derive(Args, Default)]
pub struct BatchArgs {
    /// Directory holding the purchase orders [default: 01_Commandes]
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Directory receiving the annotated copies [default: dessin]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Supplier zone as x0,y0,width,height in points from the top-left
    /// corner of the first page [default: 350,140,240,20]
    #[arg(short, long, value_parser = CaptureZone::parse)]
    zone: Option<CaptureZone>,

    /// Report what would happen without renaming or writing anything
    #[arg(long)]
    dry_run: bool,

    /// Write a per-file summary (CSV, or JSON when the path ends in .json)
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl BatchArgs {
    fn config(&self) -> PorderConfig {
        let mut config = PorderConfig::default();
        if let Some(dir) = &self.input_dir {
            config = config.with_input_dir(dir);
        }
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir);
        }
        if let Some(zone) = self.zone {
            config = config.with_zone(zone);
        }
        config
    }
}

/// JSON run report.
#[derive(Serialize)]
struct RunReport<'a> {
    generated_at: DateTime<Utc>,
    dry_run: bool,
    config: &'a PorderConfig,
    #[serde(flatten)]
    summary: &'a BatchSummary,
}

pub fn run(args: BatchArgs) -> anyhow::Result<()> {
    let config = args.config();
    debug!("Effective configuration: {:?}", config);

    let mut processor = BatchProcessor::<PdfExtractor>::new(config).with_dry_run(args.dry_run);
    let inputs = processor.prepare_inputs()?;
    let total = inputs.len();

    println!(
        "{} Found {} PDF files in {}",
        style("ℹ").blue(),
        total,
        processor.config().input_dir.display()
    );
    if args.dry_run {
        println!("{} Dry run: nothing will be renamed or written", style("ℹ").blue());
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let dry_run = args.dry_run;
    let summary = processor.run_inputs(inputs, |_, result| {
        pb.suspend(|| match result {
            Ok(report) => print_report(report, dry_run),
            Err(failure) => print_failure(failure),
        });
        pb.inc(1);
    });
    pb.finish_and_clear();

    print_banner(&summary);

    if let Some(path) = &args.summary {
        write_summary(path, &summary, processor.config(), dry_run)?;
        println!("{} Summary written to {}", style("✓").green(), path.display());
    }

    Ok(())
}

fn print_report(report: &FileReport, dry_run: bool) {
    match &report.rename {
        RenameOutcome::Renamed { from, to } => {
            let verb = if dry_run { "would rename" } else { "renamed" };
            println!(
                "{} {} {} {}",
                style("✓").green(),
                from,
                style(verb).dim(),
                style(to).bold()
            );
        }
        RenameOutcome::MissingFields { missing } => {
            let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
            println!(
                "{} {} kept: missing {}",
                style("⚠").yellow(),
                report.original_name,
                names.join(", ")
            );
        }
        RenameOutcome::Collision { candidate } => {
            println!(
                "{} {} kept: {} already exists",
                style("⚠").yellow(),
                report.original_name,
                candidate
            );
        }
    }

    let fields = &report.fields;
    println!(
        "    order: {}  date: {}  supplier: {}",
        fields.order_id.as_deref().unwrap_or("-"),
        fields.order_date.as_deref().unwrap_or("-"),
        fields.supplier.as_deref().unwrap_or("-"),
    );
    if let Some(zone_text) = &report.zone_text {
        println!("    zone: {:?}", zone_text);
    }
    if let Some(output) = &report.output_path {
        let label = if dry_run { "would write" } else { "annotated" };
        println!("    {}: {}", label, output.display());
    }
    if let Some(error) = &report.save_error {
        println!(
            "    {} annotated copy of {} not written: {}",
            style("✗").red(),
            report.final_name,
            error
        );
    }
    for warning in &report.warnings {
        println!("    {} {}", style("warning:").yellow(), warning);
    }
}

fn print_failure(failure: &FileFailure) {
    println!(
        "{} {}: {}",
        style("✗").red(),
        failure.file_name,
        failure.error
    );
}

fn print_banner(summary: &BatchSummary) {
    println!();
    println!(
        "{} Batch complete: {} files in {:.2?}",
        style("✓").green().bold(),
        summary.total(),
        Duration::from_millis(summary.elapsed_ms)
    );
    println!("  Renamed:                {}", style(summary.renamed()).green());
    println!("  Kept (missing fields):  {}", style(summary.missing_fields()).yellow());
    println!("  Kept (name collision):  {}", style(summary.collisions()).yellow());
    println!("  Failed:                 {}", style(summary.failures.len()).red());
    println!("  Copy not written:       {}", style(summary.unsaved()).red());

    if !summary.failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for failure in &summary.failures {
            println!("  - {}: {}", failure.file_name, failure.error);
        }
    }

    let unsaved: Vec<&FileReport> = summary
        .reports
        .iter()
        .filter(|r| r.save_error.is_some())
        .collect();
    if !unsaved.is_empty() {
        println!();
        println!("{}", style("Copies not written:").red());
        for report in unsaved {
            println!(
                "  - {} (was {}): {}",
                report.final_name,
                report.original_name,
                report.save_error.as_deref().unwrap_or_default()
            );
        }
    }
}

fn write_summary(
    path: &Path,
    summary: &BatchSummary,
    config: &PorderConfig,
    dry_run: bool,
) -> anyhow::Result<()> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let report = RunReport {
            generated_at: Utc::now(),
            dry_run,
            config,
            summary,
        };
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "original_name",
        "final_name",
        "status",
        "order_id",
        "order_date",
        "supplier",
        "zone_text",
        "output_path",
        "processing_time_ms",
        "notes",
    ])?;

    for report in &summary.reports {
        let status = match report.rename {
            RenameOutcome::Renamed { .. } => "renamed",
            RenameOutcome::MissingFields { .. } => "missing_fields",
            RenameOutcome::Collision { .. } => "collision",
        };
        let output = report
            .output_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let mut notes = report.warnings.clone();
        if let Some(error) = &report.save_error {
            notes.push(format!("annotated copy not written: {}", error));
        }

        wtr.write_record([
            report.original_name.as_str(),
            &report.final_name,
            status,
            report.fields.order_id.as_deref().unwrap_or(""),
            report.fields.order_date.as_deref().unwrap_or(""),
            report.fields.supplier.as_deref().unwrap_or(""),
            report.zone_text.as_deref().unwrap_or(""),
            &output,
            &report.processing_time_ms.to_string(),
            &notes.join("; "),
        ])?;
    }

    for failure in &summary.failures {
        wtr.write_record([
            failure.file_name.as_str(),
            &failure.file_name,
            "failed",
            "",
            "",
            "",
            "",
            "",
            "",
            &failure.error,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
