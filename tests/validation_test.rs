use expense_categorizer::{load_records, read_records, Categorizer, CategorizerError, ExpenseRecord, TrainingConfig};
use std::io::Write;

#[test]
fn test_missing_categories_column() {
    let data = "title,description,category\nUber,taxi,Transport\n";
    let result = read_records(data.as_bytes());
    assert!(matches!(result, Err(CategorizerError::DataFormat(_))));
}

#[test]
fn test_missing_description_column() {
    let data = "title,categories\nUber,Transport\n";
    let result = read_records(data.as_bytes());
    assert!(matches!(result, Err(CategorizerError::DataFormat(_))));
}

#[test]
fn test_load_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "title,description,categories")?;
    writeln!(file, "Uber ride,taxi to airport,Transport")?;
    writeln!(file, "Grocery,\"milk, eggs and bread\",Food")?;
    file.flush()?;

    let records = load_records(file.path())?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].description, "milk, eggs and bread");
    Ok(())
}

#[test]
fn test_category_with_single_example() {
    let mut records = Vec::new();
    for _ in 0..5 {
        records.push(ExpenseRecord::new("Uber ride", "taxi to airport", "Transport").unwrap());
        records.push(ExpenseRecord::new("Grocery", "milk and bread", "Food").unwrap());
    }
    records.push(ExpenseRecord::new("Gym", "annual membership", "Health").unwrap());

    let result = Categorizer::builder().add_records(records.clone()).build();
    match result {
        Err(CategorizerError::InsufficientData(message)) => assert!(message.contains("Health")),
        other => panic!("expected InsufficientData, got {:?}", other.map(|_| ())),
    }

    // without stratification the rare category is simply not guaranteed a held-out row
    let trained = Categorizer::builder()
        .add_records(records)
        .stratified(false)
        .build();
    assert!(trained.is_ok());
}

#[test]
fn test_single_category_dataset() {
    let records: Vec<ExpenseRecord> = (0..10)
        .map(|_| ExpenseRecord::new("Uber ride", "taxi to airport", "Transport").unwrap())
        .collect();
    let result = Categorizer::builder().add_records(records).build();
    assert!(matches!(result, Err(CategorizerError::InsufficientData(_))));
}

#[test]
fn test_stop_words_only_corpus() {
    let mut records = Vec::new();
    for _ in 0..3 {
        records.push(ExpenseRecord::new("the", "and of", "A").unwrap());
        records.push(ExpenseRecord::new("a", "to", "B").unwrap());
    }
    let result = Categorizer::builder().add_records(records).build();
    assert!(matches!(result, Err(CategorizerError::InsufficientData(_))));
}

#[test]
fn test_iteration_cap_does_not_fail() {
    let mut records = Vec::new();
    for _ in 0..5 {
        records.push(ExpenseRecord::new("Uber ride", "taxi to airport", "Transport").unwrap());
        records.push(ExpenseRecord::new("Grocery", "milk and bread", "Food").unwrap());
    }
    let config = TrainingConfig { max_iterations: 2, tolerance: 0.0, ..TrainingConfig::default() };
    let trained = Categorizer::builder()
        .with_config(config)
        .add_records(records)
        .build()
        .unwrap();
    assert!(!trained.fit.converged);
    assert_eq!(trained.fit.iterations, 2);
    assert_eq!(trained.categorizer.categorize("taxi").unwrap(), "Transport");
}
