//! Record list, summary, delete and export commands.
//!
//! Each command is generic over the record kind; [`dispatch!`] picks the
//! concrete kind from the parsed argument.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use std::sync::Arc;

use dairyops_controller::{Confirmation, DeleteOutcome, ListScreen};
use dairyops_core::records::{
    Attendance, FeedStock, MilkYield, MilkingHygiene, PurchaseRequest, RecordBackup,
};
use dairyops_core::{FilterCriteria, Record, RecordKind, RecordSchema};
use dairyops_storage::http::HttpBackend;
use sha2::{Digest, Sha256};

use crate::config::Settings;
use crate::{report_error, OutputFormat};

macro_rules! dispatch {
    ($kind:expr, $func:ident ( $($arg:expr),* $(,)? )) => {
        match $kind {
            RecordKind::MilkYield => $func::<MilkYield>($($arg),*).await,
            RecordKind::FeedStock => $func::<FeedStock>($($arg),*).await,
            RecordKind::PurchaseRequest => $func::<PurchaseRequest>($($arg),*).await,
            RecordKind::MilkingHygiene => $func::<MilkingHygiene>($($arg),*).await,
            RecordKind::Attendance => $func::<Attendance>($($arg),*).await,
            RecordKind::RecordBackup => $func::<RecordBackup>($($arg),*).await,
        }
    };
}

/// Asks on stderr and reads the answer from stdin.
struct StdinConfirmation;

impl Confirmation for StdinConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        eprintln!("{}", prompt);
        eprint!("Type 'yes' to confirm: ");
        let _ = io::stderr().flush();
        let mut input = String::new();
        io::stdin().lock().read_line(&mut input).is_ok() && input.trim() == "yes"
    }
}

async fn loaded_screen<S: RecordSchema>(
    settings: &Settings,
    criteria: FilterCriteria,
    output: OutputFormat,
    quiet: bool,
) -> ListScreen<S> {
    let backend = HttpBackend::new(settings.base_url.clone());
    let mut screen = ListScreen::new(settings.session.clone(), Arc::new(backend.records::<S>()));
    screen.set_criteria(criteria);
    if let Err(e) = screen.load().await {
        report_error(
            &format!("could not load {} records: {}", S::KIND.label(), e),
            output,
            quiet,
        );
        process::exit(1);
    }
    screen
}

// ── list ──────────────────────────────────────────────────────────────────────

pub(crate) async fn cmd_list(
    settings: &Settings,
    kind: RecordKind,
    criteria: FilterCriteria,
    output: OutputFormat,
    quiet: bool,
) {
    dispatch!(kind, list_kind(settings, criteria, output, quiet))
}

async fn list_kind<S: RecordSchema>(
    settings: &Settings,
    criteria: FilterCriteria,
    output: OutputFormat,
    quiet: bool,
) {
    let screen = loaded_screen::<S>(settings, criteria, output, quiet).await;
    let visible = screen.visible();
    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&visible).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            for record in &visible {
                println!("{}", record_line(record));
            }
            if !quiet {
                eprintln!(
                    "{} of {} {} records",
                    visible.len(),
                    screen.records().len(),
                    S::KIND.label()
                );
            }
        }
    }
}

fn record_line<S: RecordSchema>(record: &Record<S>) -> String {
    let date = record
        .inputs
        .date()
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    let facet = record.inputs.facet(&record.derived).unwrap_or("-");
    let text: Vec<&str> = record
        .inputs
        .search_fields()
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect();
    format!(
        "{}\t{}\t{}\t{}",
        record.id.as_deref().unwrap_or("-"),
        date,
        facet,
        text.join(" | ")
    )
}

// ── summary ───────────────────────────────────────────────────────────────────

pub(crate) async fn cmd_summary(
    settings: &Settings,
    kind: RecordKind,
    criteria: FilterCriteria,
    monthly: bool,
    output: OutputFormat,
    quiet: bool,
) {
    dispatch!(kind, summary_kind(settings, criteria, monthly, output, quiet))
}

async fn summary_kind<S: RecordSchema>(
    settings: &Settings,
    criteria: FilterCriteria,
    monthly: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let screen = loaded_screen::<S>(settings, criteria, output, quiet).await;

    let value = if monthly {
        let months: serde_json::Map<String, serde_json::Value> = screen
            .monthly_summary()
            .into_iter()
            .map(|(month, totals)| {
                (
                    month.to_string(),
                    serde_json::to_value(totals).unwrap_or_default(),
                )
            })
            .collect();
        serde_json::Value::Object(months)
    } else {
        serde_json::to_value(screen.totals()).unwrap_or_default()
    };

    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        }
        OutputFormat::Text => {
            if monthly {
                if let serde_json::Value::Object(months) = &value {
                    for (month, totals) in months {
                        println!("{}", month);
                        print_totals(totals, "  ");
                    }
                }
            } else {
                print_totals(&value, "");
            }
        }
    }
}

fn print_totals(totals: &serde_json::Value, indent: &str) {
    if let serde_json::Value::Object(fields) = totals {
        for (name, value) in fields {
            let shown = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("{}{}: {}", indent, name, shown);
        }
    }
}

// ── delete ────────────────────────────────────────────────────────────────────

pub(crate) async fn cmd_delete(
    settings: &Settings,
    kind: RecordKind,
    id: &str,
    yes: bool,
    output: OutputFormat,
    quiet: bool,
) {
    dispatch!(kind, delete_kind(settings, id, yes, output, quiet))
}

async fn delete_kind<S: RecordSchema>(
    settings: &Settings,
    id: &str,
    yes: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let mut screen = loaded_screen::<S>(settings, FilterCriteria::default(), output, quiet).await;
    let always = |_: &str| true;
    let confirmation: &dyn Confirmation = if yes { &always } else { &StdinConfirmation };

    match screen.delete(id, confirmation).await {
        Ok(DeleteOutcome::Deleted) => match output {
            OutputFormat::Json => println!("{}", serde_json::json!({ "deleted": id })),
            OutputFormat::Text => {
                if !quiet {
                    println!("deleted {} record {}", S::KIND.label(), id);
                }
            }
        },
        Ok(DeleteOutcome::Declined) => {
            report_error("delete aborted", output, quiet);
            process::exit(1);
        }
        Err(e) => {
            report_error(&format!("delete failed: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

// ── export ────────────────────────────────────────────────────────────────────

pub(crate) async fn cmd_export(
    settings: &Settings,
    kind: RecordKind,
    criteria: FilterCriteria,
    out: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    dispatch!(kind, export_kind(settings, criteria, out, output, quiet))
}

async fn export_kind<S: RecordSchema>(
    settings: &Settings,
    criteria: FilterCriteria,
    out: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let backend = HttpBackend::new(settings.base_url.clone());
    let mut screen = ListScreen::new(settings.session.clone(), Arc::new(backend.records::<S>()));
    screen.set_criteria(criteria);

    let file = match screen.export(&backend).await {
        Ok(file) => file,
        Err(e) => {
            report_error(&format!("export failed: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Path::new(&file.file_name).to_path_buf());
    if let Err(e) = std::fs::write(&path, &file.bytes) {
        report_error(
            &format!("could not write '{}': {}", path.display(), e),
            output,
            quiet,
        );
        process::exit(1);
    }

    let sha256 = format!("{:x}", Sha256::digest(&file.bytes));
    match output {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "path": path.display().to_string(),
                "bytes": file.bytes.len(),
                "content_type": file.content_type,
                "sha256": sha256,
            });
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        OutputFormat::Text => {
            if !quiet {
                println!(
                    "wrote {} ({} bytes, sha256 {})",
                    path.display(),
                    file.bytes.len(),
                    sha256
                );
            }
        }
    }
}
