use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use log::info;

use super::category::Category;
use super::error::CategorizerError;

/// Column names the dataset must provide
pub const TITLE_COLUMN: &str = "title";
pub const DESCRIPTION_COLUMN: &str = "description";
pub const CATEGORY_COLUMN: &str = "categories";

/// A labeled expense used for training
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    pub title: String,
    pub description: String,
    pub category: Category,
}

impl ExpenseRecord {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self, CategorizerError> {
        Ok(Self {
            title: title.into(),
            description: description.into(),
            category: Category::new(category)?,
        })
    }

    /// The text the vectorizer sees: title and description joined by a space
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

struct ColumnLayout {
    title: usize,
    description: usize,
    category: usize,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self, CategorizerError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<&str> = [TITLE_COLUMN, DESCRIPTION_COLUMN, CATEGORY_COLUMN]
            .into_iter()
            .filter(|name| find(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(CategorizerError::DataFormat(format!(
                "Missing required column(s): {} (found: {})",
                missing.join(", "),
                headers.iter().collect::<Vec<_>>().join(", ")
            )));
        }

        Ok(Self {
            title: find(TITLE_COLUMN).unwrap_or_default(),
            description: find(DESCRIPTION_COLUMN).unwrap_or_default(),
            category: find(CATEGORY_COLUMN).unwrap_or_default(),
        })
    }
}

/// Reads expense records from CSV data with a header row.
///
/// Columns may appear in any order and extra columns are ignored. Missing or
/// empty `title`/`description` values become empty strings; a blank
/// category is an error.
///
/// # Errors
/// - `DataFormat` if a required column is absent, the CSV is malformed, or a row has no category
pub fn read_records<R: Read>(reader: R) -> Result<Vec<ExpenseRecord>, CategorizerError> {
    let mut csv_reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let layout = ColumnLayout::from_headers(csv_reader.headers()?)?;

    let mut records = Vec::new();
    for (i, row) in csv_reader.records().enumerate() {
        let row = row?;
        let field = |index: usize| row.get(index).unwrap_or("").to_string();
        let category = Category::new(field(layout.category)).map_err(|_| {
            // header is line 1
            CategorizerError::DataFormat(format!("Row {} has an empty '{}' value", i + 2, CATEGORY_COLUMN))
        })?;
        records.push(ExpenseRecord {
            title: field(layout.title),
            description: field(layout.description),
            category,
        });
    }
    Ok(records)
}

/// Loads expense records from a CSV file. See [`read_records`].
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<ExpenseRecord>, CategorizerError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        CategorizerError::DataFormat(format!("Cannot open dataset {:?}: {}", path, e))
    })?;
    let records = read_records(file)?;
    info!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}
