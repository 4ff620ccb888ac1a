//! Plain-text tables for terminal output.

use std::io::{self, Write};

use atk_core::ValidationErrors;
use atk_inventory::report::display_date;
use atk_inventory::{InventoryItem, Transaction};

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// Left-aligned columns separated by two spaces.
fn write_table(out: &mut dyn Write, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    writeln!(out, "{}", format_line(headers.iter().copied(), &widths))?;
    for row in rows {
        writeln!(out, "{}", format_line(row.iter().map(String::as_str), &widths))?;
    }
    Ok(())
}

pub fn items<'a>(
    out: &mut dyn Write,
    items: impl Iterator<Item = &'a InventoryItem>,
) -> io::Result<()> {
    let rows: Vec<Vec<String>> = items
        .map(|item| {
            vec![
                item.id_typed().to_string(),
                item.name().to_string(),
                item.category().to_string(),
                item.stock().to_string(),
            ]
        })
        .collect();

    if rows.is_empty() {
        return writeln!(out, "Belum ada barang di inventaris.");
    }
    write_table(out, &["ID", "Nama Barang", "Kategori", "Stok"], &rows)
}

/// Transaction table. `empty_message` is printed instead when there is nothing to show.
pub fn transactions(
    out: &mut dyn Write,
    transactions: &[Transaction],
    empty_message: &str,
) -> io::Result<()> {
    if transactions.is_empty() {
        return writeln!(out, "{empty_message}");
    }

    let rows: Vec<Vec<String>> = transactions
        .iter()
        .map(|tx| {
            vec![
                display_date(tx.date()),
                tx.item_name().to_string(),
                tx.item_category().to_string(),
                tx.kind().to_string(),
                tx.quantity().to_string(),
            ]
        })
        .collect();

    write_table(
        out,
        &["Tanggal", "Nama Barang", "Kategori", "Jenis Transaksi", "Jumlah"],
        &rows,
    )
}

/// One `field: message` line per violation.
pub fn validation_errors(out: &mut dyn Write, errors: &ValidationErrors) -> io::Result<()> {
    for (field, msg) in errors.iter() {
        writeln!(out, "invalid {field}: {msg}")?;
    }
    Ok(())
}
