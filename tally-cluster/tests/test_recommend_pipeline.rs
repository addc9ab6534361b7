use std::collections::HashSet;

use tally_cluster::{Recommend, RecommendConfig, VocabularyMode};
use tally_core::{EmptyInputError, Error, Ledger, Transaction, DEFAULT_CATEGORIES};
use tally_ingest::read_records;

fn example_ledger() -> Ledger {
    let mut ledger = Ledger::new(DEFAULT_CATEGORIES);
    ledger
        .extend([
            Transaction::new("2024-01-01", "milk", 5.0, "groceries"),
            Transaction::new("2024-01-02", "movie", 12.0, "entertainment"),
            Transaction::new("2024-01-03", "bread", 4.0, "groceries"),
            Transaction::new("2024-01-04", "electric bill", 60.0, "utilities"),
        ])
        .unwrap();
    ledger
}

/// Every description is unique in these fixtures, so it identifies a transaction.
fn descriptions<'a>(txns: impl IntoIterator<Item = &'a Transaction>) -> Vec<String> {
    txns.into_iter().map(|t| t.description().to_string()).collect()
}

#[test]
fn test_example_ledger_end_to_end() {
    let ledger = example_ledger();
    assert_eq!(ledger.total_expenditure(), 81.0);
    assert_eq!(ledger.category_expenditure("groceries").unwrap(), 9.0);

    let recs = ledger.recommend(&RecommendConfig::seeded(42)).unwrap();
    assert!(recs.len() <= 3);
    assert_eq!(recs.total_count(), 4);

    let mut seen: Vec<String> = recs.iter().flat_map(|(_, ts)| descriptions(ts)).collect();
    seen.sort();
    assert_eq!(seen, ["bread", "electric bill", "milk", "movie"]);
}

#[test]
fn test_outlier_gets_its_own_cluster() {
    let recs = example_ledger().recommend(&RecommendConfig::seeded(7)).unwrap();
    let bill_cluster = recs
        .iter()
        .find(|(_, ts)| ts.iter().any(|t| t.description() == "electric bill"))
        .map(|(_, ts)| descriptions(ts))
        .unwrap();
    assert_eq!(bill_cluster, ["electric bill"]);
}

#[test]
fn test_partition_holds_for_many_sizes() {
    let cats = ["groceries", "entertainment", "utilities", "investments"];
    for n in 1..=25usize {
        let mut ledger = Ledger::new(DEFAULT_CATEGORIES);
        for i in 0..n {
            let amount = ((i * 37) % 101) as f64 + 0.5;
            ledger
                .add_expense(Transaction::new("2024-02-01", format!("e{i}"), amount, cats[i % 4]))
                .unwrap();
        }

        for mode in [VocabularyMode::Observed, VocabularyMode::Configured] {
            let config = RecommendConfig::seeded(n as u64).with_vocabulary(mode);
            let recs = ledger.recommend(&config).unwrap();
            assert!(recs.len() <= n.min(3), "n={n}: {} clusters", recs.len());
            assert_eq!(recs.total_count(), n);

            let unique: HashSet<String> = recs.iter().flat_map(|(_, ts)| descriptions(ts)).collect();
            assert_eq!(unique.len(), n, "n={n}: a transaction appeared twice");
        }
    }
}

#[test]
fn test_same_seed_reproduces_clusters() {
    let ledger = example_ledger();
    let config = RecommendConfig::seeded(1234);
    assert_eq!(ledger.recommend(&config).unwrap(), ledger.recommend(&config).unwrap());
}

#[test]
fn test_empty_ledger_reports_not_enough_data() {
    let ledger = Ledger::new(DEFAULT_CATEGORIES);
    let err = ledger.recommend(&RecommendConfig::default()).unwrap_err();
    assert_eq!(err, Error::EmptyInput(EmptyInputError));
    assert_eq!(err.to_string(), "not enough data: at least one expense is required");
}

#[test]
fn test_loaded_store_feeds_recommendations() {
    let data = "\
date,description,amount,category
2024-01-01,milk,5.0,Groceries
2024-01-02,concert,,Entertainment
2024-01-03,bread,4.0,groceries
2024-01-04,electric bill,60.0,Utilities
";
    let report = read_records(data.as_bytes()).unwrap();
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].row, 2);

    let mut ledger = Ledger::new(DEFAULT_CATEGORIES);
    ledger.extend(report.transactions).unwrap();
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.category_expenditure("Groceries").unwrap(), 9.0);

    let recs = ledger.recommend(&RecommendConfig::seeded(3)).unwrap();
    assert_eq!(recs.total_count(), 3);
    let summaries = recs.summaries();
    assert_eq!(summaries.len(), recs.len());
    assert_eq!(summaries.iter().map(|s| s.count).sum::<usize>(), 3);
}
