// Application state module
// Owns the two collection stores shared by every request

use std::fs;
use std::io;

use super::types::Config;
use crate::api::types::{Document, Employee};
use crate::store::JsonStore;

/// Application state
///
/// Built once at startup and shared behind an `Arc`. Each collection store
/// owns its file path and the mutex that serializes mutations to it.
pub struct AppState {
    pub config: Config,
    pub documents: JsonStore<Document>,
    pub employees: JsonStore<Employee>,
}

impl AppState {
    /// Create `AppState`, ensuring the storage directories exist
    pub fn new(config: Config) -> io::Result<Self> {
        fs::create_dir_all(config.storage.data_path())?;
        fs::create_dir_all(config.storage.uploads_path())?;

        let documents = JsonStore::new(config.storage.documents_path());
        let employees = JsonStore::new(config.storage.employees_path());

        Ok(Self {
            config,
            documents,
            employees,
        })
    }
}
