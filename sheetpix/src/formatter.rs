//! Output formatters for progress and extraction reports

use anyhow::Result;
use colored::*;
use sheetpix_core::{ExtractionReport, Progress, SheetReport};
use std::path::Path;

/// Print one progress event as it arrives
pub fn print_progress(event: &Progress) {
    let line = event.to_string();
    match event {
        Progress::CopyFailed { .. } | Progress::CleanupFailed { .. } => {
            println!("{}", line.yellow())
        }
        Progress::DrawingMissing { .. } | Progress::NoMediaDirectory => {
            println!("{}", line.bright_black())
        }
        Progress::Failed { .. } => println!("{}", line.red().bold()),
        Progress::Finished { .. } => println!("{}", line.green().bold()),
        Progress::SheetStarted { .. } => println!("{}", line.bold()),
        _ => println!("{}", line),
    }
}

/// Print the report in human-readable format with colors
pub fn print_human(file_path: &Path, report: &ExtractionReport) {
    println!();
    println!("{}", format!("Workbook: {}", file_path.display()).bold());
    println!();

    if report.media_count == 0 {
        println!("{}", "✓ No images in this workbook".green().bold());
        return;
    }

    for sheet in &report.sheets {
        print_sheet(sheet);
        println!();
    }

    println!("{}", "Summary:".bold().underline());
    println!("  {} {}", "Media files:".bold(), report.media_count);
    println!("  {} {}", "Images saved:".green().bold(), report.saved_total());
    let failed = report.failed_total();
    if failed > 0 {
        println!("  {} {}", "Failed copies:".red().bold(), failed);
    }
    println!(
        "  {} {}",
        "Output:".bold(),
        report.output_dir.display().to_string().cyan()
    );
}

fn print_sheet(sheet: &SheetReport) {
    println!("{} {}", "Sheet:".bold(), sheet.name.cyan().bold());
    if sheet.anchors > 0 {
        println!(
            "  {} {} of {} anchored images",
            "Placed:".bold(),
            sheet.exact_placed,
            sheet.anchors
        );
    }
    for (column, count) in &sheet.column_counts {
        println!("  {} {}", format!("{}:", column).yellow(), count);
    }
    if sheet.failed_copies > 0 {
        println!("  {} {}", "Failed:".red().bold(), sheet.failed_copies);
    }
}

/// Print the report in JSON format
pub fn print_json(file_path: &Path, report: &ExtractionReport) -> Result<()> {
    let output = serde_json::json!({
        "file": file_path.display().to_string(),
        "report": report,
        "summary": {
            "media": report.media_count,
            "saved": report.saved_total(),
            "failed": report.failed_total(),
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print a failed run
pub fn print_error(error: &anyhow::Error) {
    eprintln!("{} {:#}", "error:".red().bold(), error);
}
