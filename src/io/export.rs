use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::application::PublishedPage;
use crate::domain::{format_cents, Category, FilterMode, SummaryView, TransactionRow, Unit};

/// JSON document for one published transaction page.
#[derive(Debug, Serialize)]
pub struct TransactionPageExport<'a> {
    pub query: &'a str,
    pub mode: FilterMode,
    pub from_cache: bool,
    pub summary: &'a SummaryView,
    pub normal_payment_amount: String,
    pub rows: &'a [TransactionRow],
}

impl<'a> From<&'a PublishedPage> for TransactionPageExport<'a> {
    fn from(page: &'a PublishedPage) -> Self {
        Self {
            query: page.key.as_str(),
            mode: page.mode,
            from_cache: page.from_cache,
            summary: &page.view,
            normal_payment_amount: format_cents(page.summary.normal_payment_amount),
            rows: &page.rows,
        }
    }
}

/// Write the rows of a page as CSV, header first. Returns the row count.
pub fn export_rows_csv<W: Write>(rows: &[TransactionRow], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "id",
        "date",
        "description",
        "category",
        "unit",
        "amount",
        "timing",
    ])?;

    for row in rows {
        csv_writer.write_record([
            row.id.to_string(),
            row.date.clone(),
            row.description.clone(),
            row.category.clone(),
            row.unit.clone().unwrap_or_default(),
            row.amount.clone(),
            row.badge.map(|b| b.as_str().to_string()).unwrap_or_default(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(rows.len())
}

pub fn export_page_json<W: Write>(page: &PublishedPage, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, &TransactionPageExport::from(page))?;
    Ok(())
}

pub fn export_categories_csv<W: Write>(categories: &[Category], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["id", "name", "type", "color", "system", "transactions"])?;
    for category in categories {
        csv_writer.write_record([
            category.id.to_string(),
            category.name.clone(),
            category.category_type.as_str().to_string(),
            category.color.clone(),
            category.is_system.to_string(),
            category.transaction_count.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(categories.len())
}

pub fn export_units_csv<W: Write>(units: &[Unit], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["id", "unit", "status", "monthly_fee", "balance", "owner"])?;
    for unit in units {
        csv_writer.write_record([
            unit.id.to_string(),
            unit.display_name(),
            unit.status.as_str().to_string(),
            format_cents(unit.monthly_fee),
            format_cents(unit.balance),
            unit.owner_name.clone().unwrap_or_default(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(units.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PaymentTiming, TransactionId};

    #[test]
    fn test_rows_csv() {
        let rows = vec![TransactionRow {
            id: TransactionId::nil(),
            date: "2024-03-04".to_string(),
            description: "Cuota, marzo".to_string(),
            category: "Mantenimiento".to_string(),
            unit: Some("101".to_string()),
            amount: "+850.00".to_string(),
            badge: Some(PaymentTiming::Late),
        }];

        let mut out = Vec::new();
        let count = export_rows_csv(&rows, &mut out).unwrap();
        assert_eq!(count, 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,date,description,category,unit,amount,timing")
        );
        assert_eq!(
            lines.next(),
            Some("00000000-0000-0000-0000-000000000000,2024-03-04,\"Cuota, marzo\",Mantenimiento,101,+850.00,late")
        );
    }
}
