use crate::csv::{self, CsvRecord, EntityKind};
use crate::errors::{AppError, AppResult};
use crate::models::ExportResponse;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Clears the importing flag on every exit path, early returns included.
struct ImportingGuard(Arc<AtomicBool>);

impl ImportingGuard {
    fn engage(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for ImportingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Import/export control for one entity type. Errors surface as a banner
/// string through `error()` rather than bubbling out of the import call;
/// every failure leaves the importer ready for another attempt.
#[derive(Debug)]
pub struct CsvImporter {
    entity: EntityKind,
    selection: Option<PathBuf>,
    importing: Arc<AtomicBool>,
    error: Option<String>,
    row_limit: Option<usize>,
}

impl CsvImporter {
    pub fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            selection: None,
            importing: Arc::new(AtomicBool::new(false)),
            error: None,
            row_limit: None,
        }
    }

    pub fn with_row_limit(mut self, limit: usize) -> Self {
        self.row_limit = Some(limit);
        self
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn is_importing(&self) -> bool {
        self.importing.load(Ordering::SeqCst)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selection(&self) -> Option<&Path> {
        self.selection.as_deref()
    }

    /// Stages a file for import. Only `.csv` files are accepted, matching
    /// the picker filter of the dialog this backs.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> AppResult<()> {
        let path = path.into();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(AppError::Validation(format!(
                "not a CSV file: {}",
                path.display()
            )));
        }
        self.selection = Some(path);
        self.error = None;
        Ok(())
    }

    /// Reads the staged file, parses and validates it, and hands fully valid
    /// rows to `on_import` exactly once. Returns whether ingestion ran.
    ///
    /// Every column of the entity schema is required. On validation failure
    /// the newline-joined error list becomes the banner and nothing is
    /// ingested. A successful run clears the selection so the same file can
    /// be picked again.
    pub async fn import_selected<F>(&mut self, mut on_import: F) -> bool
    where
        F: FnMut(Vec<CsvRecord>),
    {
        let Some(path) = self.selection.clone() else {
            return false;
        };
        let _guard = ImportingGuard::engage(&self.importing);
        self.error = None;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "CSV import read failed");
                self.error = Some("Error reading file".to_string());
                return false;
            }
        };
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                tracing::warn!(path = %path.display(), "CSV import is not valid UTF-8");
                self.error = Some(
                    "Failed to parse CSV file. Please check the format and try again.".to_string(),
                );
                return false;
            }
        };

        let headers = self.entity.template_headers();
        let records = csv::parse(&content, headers);
        if let Some(limit) = self.row_limit {
            if records.len() > limit {
                self.error = Some(format!(
                    "CSV file exceeds the import limit of {} rows",
                    limit
                ));
                return false;
            }
        }
        let validation = csv::validate(&records, headers);
        if !validation.valid {
            self.error = Some(validation.errors.join("\n"));
            return false;
        }

        tracing::info!(
            entity = self.entity.as_str(),
            rows = records.len(),
            "CSV import accepted"
        );
        on_import(records);
        self.selection = None;
        true
    }

    /// Writes this entity's template into `dir`, creating the directory if
    /// missing, and returns the written path.
    pub fn export_template(&self, dir: &Path) -> AppResult<ExportResponse> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}_template.csv", self.entity.as_str()));
        let template = csv::generate_template(self.entity.template_headers());
        std::fs::write(&path, template)?;
        tracing::info!(path = %path.display(), "exported CSV template");
        Ok(ExportResponse {
            path: path.display().to_string(),
        })
    }
}
