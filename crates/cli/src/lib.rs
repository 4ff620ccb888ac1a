//! `atk`: command-line front end for the office-supplies stock tracker.
//!
//! Each invocation opens the local database, runs one command against the
//! stock service and exits. Mutations are saved before the process ends.

pub mod render;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use atk_core::{DomainError, ItemId};
use atk_infra::config::{DB_PATH_VAR, EXPORT_DIR_VAR};
use atk_infra::{AppConfig, ExportOutcome, SqliteCollectionStore, StockService, XlsxExporter};
use atk_inventory::{ItemCategory, TransactionFilter, TransactionType};

/// Exit code for rejected input (validation failures, refused deletes).
const EXIT_REJECTED: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "atk", about = "Office-supplies stock tracker", version)]
pub struct Cli {
    /// SQLite database file (overrides ATK_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Directory for exported reports (overrides ATK_EXPORT_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Emit logs as JSON (stderr)
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new stock item
    AddItem {
        #[arg(long)]
        name: String,
        /// Category label or code (paper, pen, binder, cleaning, printer, other)
        #[arg(long)]
        category: ItemCategory,
        /// Initial stock, must be greater than 0
        #[arg(long, allow_negative_numbers = true)]
        stock: i64,
    },

    /// List items in insertion order
    Items,

    /// Delete an item; its transactions stay in the history
    DeleteItem {
        id: ItemId,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Record an incoming or outgoing transaction
    Record {
        #[arg(long, value_name = "ITEM_ID")]
        item: Option<ItemId>,
        /// in | out
        #[arg(long = "type", value_name = "TYPE")]
        kind: TransactionType,
        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,
        /// Transaction date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Transactions in recording order
    History,

    /// Filtered transaction report, most recent first
    Report {
        #[arg(long)]
        category: Option<ItemCategory>,
        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Also write the report as a spreadsheet
        #[arg(long)]
        export: bool,
    },

    /// List item categories
    Categories,
}

/// Resolve configuration: flags, then environment, then defaults.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let flag = |path: &Option<PathBuf>| path.as_ref().map(|p| p.to_string_lossy().into_owned());
    let db = flag(&cli.db);
    let export_dir = flag(&cli.export_dir);

    AppConfig::from_lookup(|key| match key {
        DB_PATH_VAR if db.is_some() => db.clone(),
        EXPORT_DIR_VAR if export_dir.is_some() => export_dir.clone(),
        _ => std::env::var(key).ok(),
    })
    .context("failed to resolve configuration")
}

/// Execute one command, writing user-facing output to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<ExitCode> {
    let config = resolve_config(&cli)?;

    if let Command::Categories = cli.command {
        for category in ItemCategory::ALL {
            writeln!(out, "{:<10}{}", category.code(), category.label())?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let store = SqliteCollectionStore::open(&config.db_path)
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;
    let mut service = StockService::open(store).context("failed to load inventory")?;

    let outcome = match cli.command {
        Command::AddItem {
            name,
            category,
            stock,
        } => service.add_item(&name, category, stock).map(|item| {
            writeln!(
                out,
                "added {} ({}, stock {}) as {}",
                item.name(),
                item.category(),
                item.stock(),
                item.id_typed()
            )
        }),

        Command::Items => Ok(render::items(out, service.book().items())),

        Command::DeleteItem { id, yes } => {
            let Some(item) = service.book().item(&id) else {
                writeln!(out, "no item with id {id}")?;
                return Ok(ExitCode::SUCCESS);
            };
            if !yes {
                writeln!(
                    out,
                    "refusing to delete {} without --yes (its transactions will be kept)",
                    item.name()
                )?;
                return Ok(ExitCode::from(EXIT_REJECTED));
            }
            if let Some(item) = service.delete_item(&id) {
                writeln!(out, "deleted {}", item.name())?;
            }
            Ok(Ok(()))
        }

        Command::Record {
            item,
            kind,
            quantity,
            date,
        } => {
            let date = date.or_else(|| Some(Local::now().date_naive()));
            service
                .record_transaction(item, kind, quantity, date)
                .map(|recorded| {
                    writeln!(
                        out,
                        "recorded {} {} x{}; stock now {}",
                        recorded.transaction.kind(),
                        recorded.transaction.item_name(),
                        recorded.transaction.quantity(),
                        recorded.new_stock
                    )
                })
        }

        Command::History => Ok(render::transactions(
            out,
            service.book().transactions(),
            "Belum ada transaksi.",
        )),

        Command::Report {
            category,
            from,
            to,
            export,
        } => {
            let filter = TransactionFilter {
                category,
                start_date: from,
                end_date: to,
            };
            render::transactions(
                out,
                &service.report(&filter),
                "Tidak ada transaksi yang cocok dengan filter.",
            )?;

            if export {
                let exporter = XlsxExporter::new(&config.export_dir);
                match service
                    .export_report(&filter, &exporter)
                    .context("failed to export report")?
                {
                    ExportOutcome::Written { path, rows, .. } => {
                        writeln!(out, "exported {rows} rows to {}", path.display())?
                    }
                    ExportOutcome::Skipped => writeln!(out, "nothing to export")?,
                }
            }
            Ok(Ok(()))
        }

        Command::Categories => Ok(Ok(())),
    };

    match outcome {
        Ok(written) => {
            written?;
            Ok(ExitCode::SUCCESS)
        }
        Err(DomainError::Validation(errors)) => {
            render::validation_errors(out, &errors)?;
            Ok(ExitCode::from(EXIT_REJECTED))
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Harness {
        dir: tempfile::TempDir,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn run(&self, args: &[&str]) -> (ExitCode, String) {
            let db = self.dir.path().join("atk.db");
            let exports = self.dir.path().join("exports");
            let mut argv = vec![
                "atk".to_string(),
                "--db".to_string(),
                db.to_string_lossy().into_owned(),
                "--export-dir".to_string(),
                exports.to_string_lossy().into_owned(),
            ];
            argv.extend(args.iter().map(|a| a.to_string()));

            let cli = Cli::try_parse_from(argv).unwrap();
            let mut out = Vec::new();
            let code = run(cli, &mut out).unwrap();
            (code, String::from_utf8(out).unwrap())
        }

        fn add(&self, name: &str, category: &str, stock: &str) -> String {
            let (code, out) = self.run(&["add-item", "--name", name, "--category", category, "--stock", stock]);
            assert_eq!(code, ExitCode::SUCCESS, "{out}");
            out.trim_end().rsplit(' ').next().unwrap().to_string()
        }
    }

    #[test]
    fn pulpen_scenario_end_to_end() {
        let h = Harness::new();
        let id = h.add("Pulpen", "pen", "10");

        let (code, out) = h.run(&["record", "--item", &id, "--type", "in", "--quantity", "5", "--date", "2024-01-02"]);
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(out.contains("stock now 15"), "{out}");

        let (code, out) = h.run(&["record", "--item", &id, "--type", "out", "--quantity", "20", "--date", "2024-01-03"]);
        assert_eq!(code, ExitCode::from(EXIT_REJECTED));
        assert_eq!(out, "invalid quantity: quantity exceeds available stock (15)\n");

        let (_, out) = h.run(&["items"]);
        assert!(out.contains("Pulpen"));
        assert!(out.lines().nth(1).unwrap().trim_end().ends_with("15"));
    }

    #[test]
    fn invalid_item_reports_every_field() {
        let h = Harness::new();
        let (code, out) = h.run(&["add-item", "--name", " ", "--category", "paper", "--stock", "0"]);
        assert_eq!(code, ExitCode::from(EXIT_REJECTED));
        assert_eq!(
            out,
            "invalid initial_stock: initial stock must be greater than 0\ninvalid name: name cannot be empty\n"
        );
    }

    #[test]
    fn record_without_item_is_rejected() {
        let h = Harness::new();
        let (code, out) = h.run(&["record", "--type", "in", "--quantity", "-1"]);
        assert_eq!(code, ExitCode::from(EXIT_REJECTED));
        assert!(out.contains("invalid item_id: item not selected"));
        assert!(out.contains("invalid quantity: quantity must be greater than 0"));
    }

    #[test]
    fn delete_requires_confirmation_and_keeps_history() {
        let h = Harness::new();
        let id = h.add("Map", "binder", "4");
        h.run(&["record", "--item", &id, "--type", "out", "--quantity", "1", "--date", "2024-01-10"]);

        let (code, out) = h.run(&["delete-item", &id]);
        assert_eq!(code, ExitCode::from(EXIT_REJECTED));
        assert!(out.starts_with("refusing to delete Map"));

        let (code, _) = h.run(&["delete-item", &id, "--yes"]);
        assert_eq!(code, ExitCode::SUCCESS);

        let (_, out) = h.run(&["items"]);
        assert_eq!(out, "Belum ada barang di inventaris.\n");

        let (_, out) = h.run(&["history"]);
        assert!(out.contains("Map"));
        assert!(out.contains("10/1/2024"));
    }

    #[test]
    fn report_filters_and_exports() {
        let h = Harness::new();
        let kertas = h.add("Kertas A4", "Kertas", "10");
        let pen = h.add("Pulpen", "pen", "10");
        h.run(&["record", "--item", &kertas, "--type", "in", "--quantity", "2", "--date", "2024-01-15"]);
        h.run(&["record", "--item", &kertas, "--type", "in", "--quantity", "3", "--date", "2024-02-01"]);
        h.run(&["record", "--item", &pen, "--type", "in", "--quantity", "1", "--date", "2024-01-20"]);

        let (code, out) = h.run(&[
            "report", "--category", "paper", "--from", "2024-01-01", "--to", "2024-01-31", "--export",
        ]);
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(out.contains("15/1/2024"));
        assert!(!out.contains("1/2/2024"));
        assert!(!out.contains("Pulpen"));
        assert!(out.contains("exported 1 rows"));

        let workbook = h.dir.path().join("exports").join("Laporan_Transaksi_ATK.xlsx");
        assert!(out.contains(&workbook.display().to_string()), "{out}");
        assert!(std::fs::metadata(&workbook).unwrap().len() > 0);
    }

    #[test]
    fn empty_report_exports_nothing() {
        let h = Harness::new();
        let (code, out) = h.run(&["report", "--export"]);
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(
            out,
            "Tidak ada transaksi yang cocok dengan filter.\nnothing to export\n"
        );
        assert!(!h.dir.path().join("exports").exists());
    }

    #[test]
    fn unknown_category_is_a_parse_error() {
        let err = Cli::try_parse_from(["atk", "add-item", "--name", "x", "--category", "stapler", "--stock", "1"])
            .unwrap_err();
        assert!(err.to_string().contains("unknown item category"));
    }
}
