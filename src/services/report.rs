// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report aggregation, CSV output and Dutch mail text.

use crate::error::ReportError;
use crate::models::{OrderRecord, ReportSummary, ReportWindow};
use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Count orders and sum their totals in list order.
pub fn summarize(orders: &[OrderRecord]) -> ReportSummary {
    ReportSummary {
        order_count: orders.len(),
        total_revenue: orders.iter().map(|o| o.total).sum(),
    }
}

/// File name for the report of `date`.
pub fn csv_file_name(date: NaiveDate) -> String {
    format!("sales_{}.csv", date.format("%Y-%m-%d"))
}

/// Write `orders` to `{dir}/sales_{date}.csv` and return the path.
///
/// Rows go to a temp file in `dir` that is renamed into place only after a
/// complete flush; on any error the temp file is removed on drop.
pub fn write_csv(
    orders: &[OrderRecord],
    dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(csv_file_name(date));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        if orders.is_empty() {
            writer.write_record(["order_id", "created_at", "event_name", "currency", "total"])?;
        }
        for order in orders {
            writer.serialize(order)?;
        }
        writer.flush()?;
    }
    tmp.as_file_mut().flush()?;
    tmp.persist(&path).map_err(|e| ReportError::Io(e.error))?;

    tracing::info!(path = %path.display(), rows = orders.len(), "CSV written");
    Ok(path)
}

/// Format an amount with Dutch separators, e.g. `1234.5` -> `1.234,50`.
pub fn format_amount_nl(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{},{}", sign, grouped, frac_part)
}

/// Mail subject for a completed report.
pub fn render_subject(date: NaiveDate, summary: &ReportSummary) -> String {
    format!(
        "Verkooprapport {} – {} orders, €{}",
        date.format("%Y-%m-%d"),
        summary.order_count,
        format_amount_nl(summary.total_revenue)
    )
}

/// Mail body for a completed report.
pub fn render_body(window: &ReportWindow, summary: &ReportSummary, partial: bool) -> String {
    let mut body = format!(
        "Goedemorgen,\n\n\
         Hierbij het verkooprapport voor {} (NL-tijd):\n\
         - Aantal orders: {}\n\
         - Omzet: €{}\n\n\
         In de bijlage vind je de CSV met details.\n\
         Periode: {} t/m {}\n",
        window.date.format("%Y-%m-%d"),
        summary.order_count,
        format_amount_nl(summary.total_revenue),
        window.start,
        window.end,
    );
    if partial {
        body.push_str(
            "\nLet op: niet alle pagina's konden worden opgehaald, het rapport is onvolledig.\n",
        );
    }
    body
}

/// Mail subject when the report could not be produced.
pub fn render_error_subject(date: NaiveDate) -> String {
    format!("Fout in verkooprapport {}", date.format("%Y-%m-%d"))
}

/// Mail body when the report could not be produced.
pub fn render_error_body(date: NaiveDate, error: &str) -> String {
    format!(
        "Er is een fout opgetreden bij het ophalen van orders voor {}:\n\n{}\n\n\
         Controleer de Eventix API credentials en probeer opnieuw.",
        date.format("%Y-%m-%d"),
        error
    )
}
