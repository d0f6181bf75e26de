//! Inspect command - show what a single purchase order yields, without
//! renaming or annotating it.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::warn;

use porder_core::{
    candidate_filename, CaptureZone, DocumentSession, Field, OrderFields, OrderParser,
    PdfExtractor,
};

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Supplier zone as x0,y0,width,height [default: 350,140,240,20]
    #[arg(short, long, value_parser = CaptureZone::parse)]
    zone: Option<CaptureZone>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Also print the full extracted text
    #[arg(long)]
    show_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text summary
    Text,
    /// JSON output
    Json,
}

#[derive(Serialize)]
struct Inspection {
    file: PathBuf,
    pages: u32,
    zone: CaptureZone,
    fields: OrderFields,
    missing: Vec<Field>,
    candidate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let zone = args.zone.unwrap_or_default();
    let session = DocumentSession::<PdfExtractor>::open(&args.input)?;

    let (text, text_error) = match session.full_text() {
        Ok(text) => (text, None),
        Err(e) => {
            warn!("Full text unavailable: {}", e);
            (String::new(), Some(e.to_string()))
        }
    };
    let fields = OrderParser::new()
        .parse(&text)
        .with_supplier(&session.zone_text(&zone)?);

    let inspection = Inspection {
        file: args.input.clone(),
        pages: session.page_count(),
        zone,
        missing: fields.missing(),
        candidate: candidate_filename(&fields),
        fields,
        text_error,
        text: args.show_text.then_some(text),
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&inspection)?),
        OutputFormat::Text => print_text(&inspection),
    }
    Ok(())
}

fn print_text(inspection: &Inspection) {
    println!("File:       {}", inspection.file.display());
    println!("Pages:      {}", inspection.pages);
    println!("Zone:       {}", inspection.zone);
    println!();

    let show = |value: &Option<String>| match value {
        Some(v) => style(v.clone()).bold().to_string(),
        None => style("not found".to_string()).red().to_string(),
    };
    println!("Order:      {}", show(&inspection.fields.order_id));
    println!("Date:       {}", show(&inspection.fields.order_date));
    println!("Supplier:   {}", show(&inspection.fields.supplier));
    println!();

    match &inspection.candidate {
        Some(name) => println!("{} Would be named {}", style("✓").green(), name),
        None => {
            let names: Vec<String> = inspection.missing.iter().map(ToString::to_string).collect();
            println!(
                "{} Name kept: missing {}",
                style("⚠").yellow(),
                names.join(", ")
            );
        }
    }

    if let Some(error) = &inspection.text_error {
        println!("{} Full text unavailable: {}", style("warning:").yellow(), error);
    }
    if let Some(text) = &inspection.text {
        println!();
        println!("{}", style("Extracted text:").dim());
        println!("{}", text);
    }
}
