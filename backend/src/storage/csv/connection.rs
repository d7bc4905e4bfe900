use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::storage::traits::Connection;

use super::expense_repository::ExpenseRepository;
use super::global_config_repository::GlobalConfigRepository;
use super::salary_repository::SalaryRepository;
use super::user_repository::UserRepository;

pub const EXPENSES_FILE_NAME: &str = "expenses.csv";
pub const SALARIES_FILE_NAME: &str = "salaries.yaml";
pub const USERS_FILE_NAME: &str = "users.yaml";
pub const EXPENSES_CSV_HEADER: &str = "id,owner_id,date,category,description,amount,created_at\n";

const OWNERS_DIRECTORY: &str = "owners";

/// CsvConnection manages file paths under the data directory and serialises
/// read-modify-write cycles on the files it hands out
#[derive(Clone, Debug)]
pub struct CsvConnection {
    base_directory: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).with_context(|| {
                format!("Failed to create data directory {}", base_path.display())
            })?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Directory holding one owner's files
    pub fn get_owner_directory(&self, owner_key: &str) -> PathBuf {
        self.base_directory
            .join(OWNERS_DIRECTORY)
            .join(Self::generate_safe_directory_name(owner_key))
    }

    pub fn get_expenses_file_path(&self, owner_key: &str) -> PathBuf {
        self.get_owner_directory(owner_key).join(EXPENSES_FILE_NAME)
    }

    pub fn get_salaries_file_path(&self, owner_key: &str) -> PathBuf {
        self.get_owner_directory(owner_key).join(SALARIES_FILE_NAME)
    }

    pub fn get_users_file_path(&self) -> PathBuf {
        self.base_directory.join(USERS_FILE_NAME)
    }

    /// Ensure the owner's directory and expenses file (with header) exist
    pub fn ensure_expenses_file_exists(&self, owner_key: &str) -> Result<()> {
        let owner_dir = self.get_owner_directory(owner_key);
        if !owner_dir.exists() {
            fs::create_dir_all(&owner_dir)?;
            debug!("Created owner directory: {}", owner_dir.display());
        }

        let file_path = owner_dir.join(EXPENSES_FILE_NAME);
        if !file_path.exists() {
            Self::write_atomically(&file_path, EXPENSES_CSV_HEADER.as_bytes())?;
        }

        Ok(())
    }

    /// Write the full content to a temp file next to `path`, then rename it
    /// over `path`. Readers see either the old or the new file, never a mix.
    pub fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    /// Held across a read-modify-write of any file under this connection
    pub fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Map an owner key onto a directory name. Keeps `[A-Za-z0-9_-]`,
    /// replaces anything else with `_`.
    pub fn generate_safe_directory_name(owner_key: &str) -> String {
        let safe: String = owner_key
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if safe.is_empty() {
            "_".to_string()
        } else {
            safe
        }
    }
}

impl Connection for CsvConnection {
    type ExpenseRepository = ExpenseRepository;
    type SalaryRepository = SalaryRepository;
    type UserRepository = UserRepository;
    type GlobalConfigRepository = GlobalConfigRepository;

    fn create_expense_repository(&self) -> Self::ExpenseRepository {
        ExpenseRepository::new(self.clone())
    }

    fn create_salary_repository(&self) -> Self::SalaryRepository {
        SalaryRepository::new(self.clone())
    }

    fn create_user_repository(&self) -> Self::UserRepository {
        UserRepository::new(self.clone())
    }

    fn create_global_config_repository(&self) -> Self::GlobalConfigRepository {
        GlobalConfigRepository::new(self.clone())
    }
}
