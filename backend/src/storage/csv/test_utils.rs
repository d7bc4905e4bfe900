//! Test utilities with RAII cleanup
//!
//! Every environment lives in its own temporary directory that is removed
//! when the environment is dropped, even if the test panics.

use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

use super::connection::CsvConnection;
use super::expense_repository::ExpenseRepository;
use super::global_config_repository::GlobalConfigRepository;
use super::salary_repository::SalaryRepository;
use super::user_repository::UserRepository;

/// Temporary data directory plus a connection rooted in it
pub struct TestEnvironment {
    pub connection: CsvConnection,
    /// Base directory path for manual inspection if needed
    pub base_path: PathBuf,
    _temp_dir: TempDir, // Keep alive to prevent cleanup
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        Ok(Self {
            connection,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }
}

/// Repository instances sharing one test environment
pub struct RepositoryTestHelper {
    pub env: TestEnvironment,
    pub expense_repo: ExpenseRepository,
    pub salary_repo: SalaryRepository,
    pub user_repo: UserRepository,
    pub global_config_repo: GlobalConfigRepository,
}

impl RepositoryTestHelper {
    pub fn new() -> Result<Self> {
        Ok(Self::from_env(TestEnvironment::new()?))
    }

    pub fn from_env(env: TestEnvironment) -> Self {
        let connection = env.connection.clone();
        Self {
            expense_repo: ExpenseRepository::new(connection.clone()),
            salary_repo: SalaryRepository::new(connection.clone()),
            user_repo: UserRepository::new(connection.clone()),
            global_config_repo: GlobalConfigRepository::new(connection),
            env,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_cleanup() -> Result<()> {
        let base_path;
        {
            let env = TestEnvironment::new()?;
            base_path = env.base_path.clone();
            assert!(base_path.exists());
        }
        assert!(!base_path.exists());
        Ok(())
    }
}
