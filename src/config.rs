//! Store configuration.

use std::path::PathBuf;

use crate::{ROWS_PER_PAGE, TABLE_MAX_PAGES};

#[derive(Debug, Clone)]
pub struct Config {
    /// Backing file, created on open if it does not exist.
    pub db_path: PathBuf,

    /// Page cache capacity; the table holds at most `ROWS_PER_PAGE * max_pages` rows.
    pub max_pages: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("rowdb.db"),
            max_pages: TABLE_MAX_PAGES,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `None` when the page limit is too large to address as rows.
    pub fn max_rows(&self) -> Option<usize> {
        ROWS_PER_PAGE.checked_mul(self.max_pages)
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    pub fn max_pages(mut self, pages: usize) -> Self {
        self.config.max_pages = pages;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
