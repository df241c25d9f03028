// Spreadsheet import - replaces all comments with the rows of an annotated sheet
//
// Expected layout: a header row, then one comment per row with the text in the
// first column and up to three annotator labels in the next three columns.

use calamine::{open_workbook_auto, Data, Reader};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::aggregator::recompute_topic;
use crate::database::SentimentDatabase;
use crate::error::{AppError, AppResult};
use crate::models::{local_now, majority_vote, Comment, NewComment, Sentiment};

/// Annotation columns that follow the content column.
const LABEL_COLUMNS: usize = 3;

/// Cell text of one data row; `None` marks an empty cell.
pub type RowCells = Vec<Option<String>>;

/// A data row that could not be read. Logged and skipped during import.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub row: usize,
    pub reason: String,
}

/// Content and decided label for one data row.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub content: String,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub imported: u64,
    pub skipped: usize,
}

/// Replace every stored comment with the rows of `path`, then refresh the topic.
///
/// The file is read completely before anything is written, so a missing or
/// unreadable file leaves the database as it was. Rows that cannot be read are
/// skipped. The delete and the inserts share one transaction.
pub async fn load_from_file(
    db: &SentimentDatabase,
    path: impl AsRef<Path>,
) -> AppResult<ImportReport> {
    let path: PathBuf = path.as_ref().to_path_buf();
    if !path.exists() {
        return Err(AppError::ImportError(format!(
            "File does not exist: {}",
            path.display()
        )));
    }

    let rows = {
        let path = path.clone();
        tokio::task::spawn_blocking(move || read_rows(&path))
            .await
            .map_err(|e| AppError::Internal(format!("Spreadsheet reader task failed: {}", e)))??
    };
    info!(file = %path.display(), rows = rows.len(), "Read spreadsheet");

    let total_rows = rows.len();
    let now = local_now();
    let mut comments = Vec::with_capacity(total_rows);
    let mut skipped = 0;
    for row in rows {
        match row {
            Ok(cells) => {
                let classified = classify_row(&cells);
                comments.push(NewComment {
                    content: classified.content,
                    sentiment: classified.sentiment.as_str().to_string(),
                    sentiment_score: classified.sentiment.score(),
                    timestamp: now,
                });
            }
            Err(e) => {
                warn!(row = e.row, error = %e.reason, "Skipping unreadable row");
                skipped += 1;
            }
        }
    }

    let mut tx = db.begin().await?;
    let removed = Comment::delete_all(&mut tx).await?;
    let imported = Comment::insert_batch(&mut tx, &comments).await?;
    tx.commit()
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to commit import: {}", e)))?;

    let mut session = db.session().await?;
    recompute_topic(&mut session).await?;

    let report = ImportReport {
        total_rows,
        imported,
        skipped,
    };
    info!(
        file = %path.display(),
        removed,
        imported = report.imported,
        skipped = report.skipped,
        "Import finished"
    );
    Ok(report)
}

/// Decide content and sentiment for one row by majority vote over its labels.
pub fn classify_row(cells: &[Option<String>]) -> ClassifiedRow {
    let content = cells.first().cloned().flatten().unwrap_or_default();
    let votes: Vec<Sentiment> = cells
        .iter()
        .skip(1)
        .take(LABEL_COLUMNS)
        .filter_map(|cell| cell.as_deref().and_then(Sentiment::normalize))
        .collect();

    ClassifiedRow {
        content,
        sentiment: majority_vote(&votes),
    }
}

/// Read all data rows of a CSV file or the first sheet of a workbook.
/// The header row and fully blank rows are dropped.
pub fn read_rows(path: &Path) -> AppResult<Vec<Result<RowCells, RowError>>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let rows = if is_csv {
        read_csv(path)?
    } else {
        read_workbook(path)?
    };

    Ok(rows
        .into_iter()
        .filter(|row| match row {
            Ok(cells) => cells.iter().any(Option::is_some),
            Err(_) => true,
        })
        .collect())
}

fn read_csv(path: &Path) -> AppResult<Vec<Result<RowCells, RowError>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::ImportError(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        match record {
            Ok(record) => rows.push(Ok(record.iter().map(text_cell).collect())),
            // The reader cannot make progress past an I/O error
            Err(e) if e.is_io_error() => {
                return Err(AppError::ImportError(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
            Err(e) => rows.push(Err(RowError {
                row,
                reason: e.to_string(),
            })),
        }
    }
    Ok(rows)
}

fn read_workbook(path: &Path) -> AppResult<Vec<Result<RowCells, RowError>>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::ImportError(format!("Failed to open {}: {}", path.display(), e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            AppError::ImportError(format!("Workbook {} has no worksheets", path.display()))
        })?
        .map_err(|e| {
            AppError::ImportError(format!("Failed to read worksheet of {}: {}", path.display(), e))
        })?;

    Ok(range
        .rows()
        .skip(1)
        .enumerate()
        .map(|(row, cells)| workbook_row(row, cells))
        .collect())
}

fn workbook_row(row: usize, cells: &[Data]) -> Result<RowCells, RowError> {
    if let Some(Data::Error(e)) = cells.first() {
        return Err(RowError {
            row,
            reason: format!("content cell holds an error value: {:?}", e),
        });
    }
    Ok(cells.iter().map(data_cell).collect())
}

fn text_cell(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

fn data_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => text_cell(s),
        Data::Int(i) => Some(i.to_string()),
        // Label codes are usually stored as floats; render 1.0 as "1".
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some((*f as i64).to_string()),
        Data::Float(f) => Some(f.to_string()),
        other => Some(other.to_string()),
    }
}
