use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use tally_cluster::Recommend;
use tally_core::{Error, Ledger, Transaction, parse_amount, render_advice_prompt};
use tally_ingest::{append_record, load_records};

mod config;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")"),
    about = "Personal expense ledger with spending clusters"
)]
struct Cli {
    /// Config file (default: $TALLY_HOME/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Transaction CSV (overrides storage.data_file)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Total expenditure and per-category breakdown
    Summary,

    /// Record one expense and append it to the store
    Add {
        /// Kept verbatim, e.g. 2024-01-31 or 31/01/2024
        #[arg(long)]
        date: String,

        #[arg(long)]
        description: String,

        /// Same forms the store accepts, e.g. -3.5 or $1,204.10
        #[arg(long, allow_negative_numbers = true, value_parser = parse_amount)]
        amount: f64,

        #[arg(long)]
        category: String,
    },

    /// Group expenses into up to three spending clusters
    Recommend {
        /// Fixed seed for reproducible clusters (overrides clustering.seed)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the plain-text ledger rendering used for advice requests
    Prompt,

    /// Write a default config file if none exists
    InitConfig,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(p) => p,
        None => config::config_path()?,
    };

    if let Command::InitConfig = cli.command {
        return init_config(&config_path);
    }

    let cfg = config::load_config(&config_path)?;
    let data_path = match cli.data {
        Some(p) => p,
        None => cfg.data_path(&state::ensure_tally_home()?),
    };
    let mut ledger = load_ledger(&cfg, &data_path)?;

    match cli.command {
        Command::Summary => {
            println!("Total Expenditure: {:.2}", ledger.total_expenditure());
            for (label, total) in ledger.category_breakdown() {
                println!("{} Expenditure: {:.2}", label, total);
            }
            let unmatched: Vec<_> = ledger
                .expenses()
                .iter()
                .filter(|e| !ledger.is_known_category(e.category()))
                .collect();
            if !unmatched.is_empty() {
                let total: f64 = unmatched.iter().map(|e| e.amount()).sum();
                println!("Other categories: {:.2} ({} expenses)", total, unmatched.len());
            }
        }

        Command::Add {
            date,
            description,
            amount,
            category,
        } => {
            add_to_store(
                &mut ledger,
                &data_path,
                Transaction::new(date, description, amount, category),
            )?;
            println!("Expense added successfully.");
        }

        Command::Recommend { seed } => {
            let mut rc = cfg.recommend_config();
            if seed.is_some() {
                rc.kmeans.seed = seed;
            }
            match ledger.recommend(&rc) {
                Ok(recs) => {
                    for summary in recs.summaries() {
                        println!("{}", summary.description);
                        for t in recs.get(summary.label).unwrap_or_default() {
                            println!(
                                "  {} - {} - {:.2} - {}",
                                t.date(),
                                t.description(),
                                t.amount(),
                                t.category()
                            );
                        }
                    }
                }
                Err(Error::EmptyInput(_)) => {
                    println!("Not enough data for recommendations yet. Add some expenses first.");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Command::Prompt => {
            print!("{}", render_advice_prompt(&ledger));
        }

        // Handled before the store is loaded.
        Command::InitConfig => {}
    }

    Ok(())
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tally=info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    config::save_config(path, &Config::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Bad rows are skipped with a warning; they never abort the session.
fn load_ledger(cfg: &Config, path: &Path) -> Result<Ledger> {
    let report = load_records(path).with_context(|| format!("loading {}", path.display()))?;
    if !report.is_clean() {
        warn!(
            path = %path.display(),
            skipped = report.rejected.len(),
            "some stored rows could not be read"
        );
    }

    let mut ledger = Ledger::with_strictness(&cfg.ledger.categories, cfg.strictness());
    for t in report.transactions {
        if let Err(e) = ledger.add_expense(t) {
            warn!(error = %e, "skipping stored expense");
        }
    }
    Ok(ledger)
}

/// Add through the ledger so strict checks apply, then append only the new row.
/// Rows the load skipped stay in the file.
fn add_to_store(ledger: &mut Ledger, path: &Path, transaction: Transaction) -> Result<()> {
    ledger.add_expense(transaction).context("adding expense")?;
    let Some(stored) = ledger.expenses().last() else {
        return Ok(());
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    append_record(path, stored).with_context(|| format!("appending to {}", path.display()))?;
    info!(path = %path.display(), expenses = ledger.len(), "expense appended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn strict_config() -> Config {
        let mut cfg = Config::default();
        cfg.ledger.strict = true;
        cfg
    }

    #[test]
    fn test_add_keeps_rows_the_load_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.csv");
        fs::write(
            &path,
            "date,description,amount,category\n\
             2024-01-01,milk,5.0,groceries\n\
             2024-01-02,concert,,entertainment\n\
             2024-01-03,gadget,30.0,gadgets\n",
        )
        .unwrap();

        let mut ledger = load_ledger(&strict_config(), &path).unwrap();
        assert_eq!(ledger.len(), 1);

        add_to_store(&mut ledger, &path, Transaction::new("2024-01-04", "bread", 4.0, "Groceries")).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("2024-01-02,concert,,entertainment"), "{text}");
        assert!(text.contains("2024-01-03,gadget,30.0,gadgets"), "{text}");
        assert!(text.ends_with("2024-01-04,bread,4.0,groceries\n"), "{text}");

        let reloaded = load_ledger(&Config::default(), &path).unwrap();
        assert_eq!(reloaded.len(), 3);
    }

    #[test]
    fn test_rejected_add_leaves_store_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.csv");
        let original = "date,description,amount,category\n2024-01-01,milk,5.0,groceries\n";
        fs::write(&path, original).unwrap();

        let mut ledger = load_ledger(&strict_config(), &path).unwrap();
        let result = add_to_store(&mut ledger, &path, Transaction::new("d", "gadget", 30.0, "gadgets"));
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_add_creates_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("transactions.csv");
        let mut ledger = load_ledger(&Config::default(), &path).unwrap();
        add_to_store(&mut ledger, &path, Transaction::new("d", "milk", 5.0, "groceries")).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "date,description,amount,category\nd,milk,5.0,groceries\n"
        );
    }

    fn add_args(amount: &str) -> Vec<&str> {
        vec![
            "tally", "add", "--date", "2024-01-01", "--description", "milk", "--amount", amount,
            "--category", "groceries",
        ]
    }

    #[test]
    fn test_add_amount_rejects_non_finite() {
        for bad in ["NaN", "nan", "inf", "-inf", "infinity", "1e999", "abc"] {
            assert!(Cli::try_parse_from(add_args(bad)).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_add_amount_accepts_store_forms() {
        for (text, expected) in [("-3.5", -3.5), ("$1,204.10", 1204.1), ("1e3", 1000.0)] {
            let cli = Cli::try_parse_from(add_args(text)).unwrap();
            match cli.command {
                Command::Add { amount, .. } => assert_eq!(amount, expected),
                other => panic!("unexpected command {other:?}"),
            }
        }
    }
}
