//! Append-only row storage on top of the [`Pager`].
//!
//! Row `i` lives on page `i / ROWS_PER_PAGE` at byte offset
//! `(i % ROWS_PER_PAGE) * ROW_SIZE`. Rows are densely packed from index 0
//! and the unused tail of every page is never written with row data.

use tracing::{debug, warn};

use crate::{
    MAX_CONFIGURABLE_PAGES, PAGE_SIZE, ROW_SIZE, ROWS_PER_PAGE,
    config::Config,
    error::{DbError, Result},
    pager::Pager,
    row::Row,
};

const _: () = assert!(ROWS_PER_PAGE > 0 && ROWS_PER_PAGE * ROW_SIZE <= PAGE_SIZE);

#[derive(Debug)]
pub struct Table {
    pager: Pager,
    num_rows: usize,
    max_rows: usize,
}

/// Page number and byte offset within that page for a row index.
pub fn row_slot(row_num: usize) -> (usize, usize) {
    let page_num = row_num / ROWS_PER_PAGE;
    let byte_offset = (row_num % ROWS_PER_PAGE) * ROW_SIZE;
    (page_num, byte_offset)
}

/// Number of whole rows stored in a file of `file_length` bytes.
///
/// Full pages are flushed with their unused tail, so each complete page
/// contributes exactly `ROWS_PER_PAGE` rows and only the trailing partial
/// page is divided by `ROW_SIZE`.
pub fn rows_in_file(file_length: u64) -> usize {
    let page_size = PAGE_SIZE as u64;
    let full_pages = (file_length / page_size) as usize;
    let trailing = (file_length % page_size) as usize;
    full_pages * ROWS_PER_PAGE + (trailing / ROW_SIZE).min(ROWS_PER_PAGE)
}

impl Table {
    pub fn open(config: &Config) -> Result<Self> {
        let pager = Pager::open(&config.db_path, config.max_pages)?;
        let max_rows = config.max_rows().ok_or(DbError::InvalidPageLimit {
            max_pages: config.max_pages,
            limit: MAX_CONFIGURABLE_PAGES,
        })?;
        let num_rows = rows_in_file(pager.file_length());

        if num_rows > max_rows {
            return Err(DbError::FileTooLarge {
                rows: num_rows,
                max_rows,
            });
        }

        debug!(num_rows, max_rows, "opened table");
        Ok(Self {
            pager,
            num_rows,
            max_rows,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    fn slot(&mut self, row_num: usize) -> Result<&mut [u8; ROW_SIZE]> {
        let (page_num, byte_offset) = row_slot(row_num);
        let page = self.pager.get_page(page_num)?;
        page[byte_offset..]
            .first_chunk_mut::<ROW_SIZE>()
            .ok_or(DbError::RowOutOfBounds(row_num))
    }

    /// Appends `row` after the last stored row. A full table is reported as
    /// [`DbError::TableFull`] and leaves the table untouched.
    pub fn insert(&mut self, row: &Row) -> Result<()> {
        if self.num_rows >= self.max_rows {
            warn!(num_rows = self.num_rows, "insert into full table");
            return Err(DbError::TableFull);
        }

        let row_num = self.num_rows;
        row.serialize(self.slot(row_num)?);
        self.num_rows += 1;
        Ok(())
    }

    /// Lazily yields every stored row in insertion order.
    pub fn select(&mut self) -> Rows<'_> {
        Rows {
            table: self,
            next: 0,
        }
    }

    /// Flushes every page holding live rows and releases the file. Full
    /// pages are written whole, the trailing partial page only up to its
    /// last row.
    pub fn close(mut self) -> Result<()> {
        let num_full_pages = self.num_rows / ROWS_PER_PAGE;

        for page_num in 0..num_full_pages {
            // Pages never touched since open are already on disk.
            if self.pager.is_loaded(page_num) {
                self.pager.flush(page_num, PAGE_SIZE)?;
            }
        }

        let additional_rows = self.num_rows % ROWS_PER_PAGE;
        if additional_rows > 0 && self.pager.is_loaded(num_full_pages) {
            self.pager
                .flush(num_full_pages, additional_rows * ROW_SIZE)?;
        }

        debug!(num_rows = self.num_rows, "closing table");
        self.pager.close()
    }
}

/// Iterator returned by [`Table::select`]. Stops after the first error.
pub struct Rows<'a> {
    table: &'a mut Table,
    next: usize,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.table.num_rows {
            return None;
        }

        let row_num = self.next;
        match self.table.slot(row_num) {
            Ok(slot) => {
                self.next += 1;
                Some(Ok(Row::deserialize(slot)))
            }
            Err(e) => {
                self.next = self.table.num_rows;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TABLE_MAX_PAGES, TABLE_MAX_ROWS};
    use std::path::Path;
    use tempfile::tempdir;

    fn config(path: &Path) -> Config {
        Config::builder().db_path(path).build()
    }

    fn sample(i: usize) -> Row {
        Row::new(i as u32 + 1, &format!("user{i}"), &format!("person{i}@example.com"))
    }

    fn collect(table: &mut Table) -> Vec<Row> {
        table.select().collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn rows_per_page_is_thirteen() {
        assert_eq!(ROWS_PER_PAGE, 13);
        assert_eq!(TABLE_MAX_ROWS, 1300);
    }

    #[test]
    fn row_slot_addressing() {
        assert_eq!(row_slot(0), (0, 0));
        assert_eq!(row_slot(12), (0, 12 * ROW_SIZE));
        assert_eq!(row_slot(13), (1, 0));

        for k in 0..TABLE_MAX_PAGES {
            let first = k * ROWS_PER_PAGE;
            let last = first + ROWS_PER_PAGE - 1;
            assert_eq!(row_slot(first).0, k);
            assert_eq!(row_slot(last).0, k);
            assert_eq!(row_slot(last + 1).0, k + 1);
        }
    }

    #[test]
    fn rows_in_file_ignores_page_slack() {
        assert_eq!(rows_in_file(0), 0);
        assert_eq!(rows_in_file(ROW_SIZE as u64 - 1), 0);
        assert_eq!(rows_in_file(3 * ROW_SIZE as u64 + 10), 3);
        assert_eq!(rows_in_file(PAGE_SIZE as u64), ROWS_PER_PAGE);
        assert_eq!(rows_in_file(2 * PAGE_SIZE as u64), 2 * ROWS_PER_PAGE);
        assert_eq!(
            rows_in_file((2 * PAGE_SIZE + ROW_SIZE) as u64),
            2 * ROWS_PER_PAGE + 1
        );
    }

    #[test]
    fn empty_table_selects_nothing() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(&config(&dir.path().join("t.db"))).unwrap();

        assert!(table.is_empty());
        assert_eq!(table.select().count(), 0);
    }

    #[test]
    fn insert_then_select_preserves_order() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(&config(&dir.path().join("t.db"))).unwrap();

        let rows: Vec<Row> = (0..30).map(sample).collect();
        for row in &rows {
            table.insert(row).unwrap();
        }

        assert_eq!(table.num_rows(), 30);
        assert_eq!(collect(&mut table), rows);
        // A second scan starts from the beginning again.
        assert_eq!(table.select().count(), 30);
    }

    #[test]
    fn fourteenth_row_starts_page_one() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(&config(&dir.path().join("t.db"))).unwrap();

        for i in 0..=ROWS_PER_PAGE {
            table.insert(&sample(i)).unwrap();
        }

        let page = table.pager.get_page(1).unwrap();
        assert_eq!(Row::deserialize(page[..ROW_SIZE].try_into().unwrap()), sample(13));
        let page = table.pager.get_page(0).unwrap();
        assert!(page[ROWS_PER_PAGE * ROW_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn insert_into_full_table_fails() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(&config(&dir.path().join("t.db"))).unwrap();

        for i in 0..TABLE_MAX_ROWS {
            table.insert(&sample(i)).unwrap();
        }

        assert!(matches!(table.insert(&sample(0)), Err(DbError::TableFull)));
        assert_eq!(table.num_rows(), TABLE_MAX_ROWS);
        assert_eq!(table.select().count(), TABLE_MAX_ROWS);
    }

    #[test]
    fn max_pages_bounds_capacity() {
        let dir = tempdir().unwrap();
        let config = Config::builder()
            .db_path(dir.path().join("t.db"))
            .max_pages(1)
            .build();
        let mut table = Table::open(&config).unwrap();

        for i in 0..ROWS_PER_PAGE {
            table.insert(&sample(i)).unwrap();
        }
        assert!(matches!(table.insert(&sample(0)), Err(DbError::TableFull)));
    }

    #[test]
    fn close_writes_only_live_bytes_of_partial_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.db");
        let mut table = Table::open(&config(&path)).unwrap();

        for i in 0..ROWS_PER_PAGE + 2 {
            table.insert(&sample(i)).unwrap();
        }
        table.close().unwrap();

        let len = std::fs::metadata(&path).unwrap().len() as usize;
        assert_eq!(len, PAGE_SIZE + 2 * ROW_SIZE);
    }

    #[test]
    fn rows_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.db");

        // Spans several full pages plus a partial one.
        let rows: Vec<Row> = (0..3 * ROWS_PER_PAGE + 5).map(sample).collect();
        let mut table = Table::open(&config(&path)).unwrap();
        for row in &rows {
            table.insert(row).unwrap();
        }
        table.close().unwrap();

        let mut table = Table::open(&config(&path)).unwrap();
        assert_eq!(table.num_rows(), rows.len());
        assert_eq!(collect(&mut table), rows);
        table.close().unwrap();
    }

    #[test]
    fn appends_after_reopen_continue_the_sequence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.db");

        let mut table = Table::open(&config(&path)).unwrap();
        for i in 0..5 {
            table.insert(&sample(i)).unwrap();
        }
        table.close().unwrap();

        let mut table = Table::open(&config(&path)).unwrap();
        for i in 5..20 {
            table.insert(&sample(i)).unwrap();
        }
        table.close().unwrap();

        let mut table = Table::open(&config(&path)).unwrap();
        let expected: Vec<Row> = (0..20).map(sample).collect();
        assert_eq!(collect(&mut table), expected);
    }

    #[test]
    fn full_table_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.db");

        let mut table = Table::open(&config(&path)).unwrap();
        for i in 0..TABLE_MAX_ROWS {
            table.insert(&sample(i)).unwrap();
        }
        table.close().unwrap();

        let mut table = Table::open(&config(&path)).unwrap();
        assert_eq!(table.num_rows(), TABLE_MAX_ROWS);
        assert!(matches!(table.insert(&sample(0)), Err(DbError::TableFull)));
        let rows = collect(&mut table);
        assert_eq!(rows.last(), Some(&sample(TABLE_MAX_ROWS - 1)));
    }

    #[test]
    fn huge_page_limit_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.db");

        for max_pages in [usize::MAX, usize::MAX / 16] {
            let config = Config::builder().db_path(&path).max_pages(max_pages).build();
            assert!(matches!(
                Table::open(&config),
                Err(DbError::InvalidPageLimit { .. })
            ));
        }
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.db");
        std::fs::write(&path, vec![0u8; 2 * PAGE_SIZE]).unwrap();

        let config = Config::builder().db_path(&path).max_pages(1).build();
        match Table::open(&config) {
            Err(DbError::FileTooLarge { rows, max_rows }) => {
                assert_eq!(rows, 2 * ROWS_PER_PAGE);
                assert_eq!(max_rows, ROWS_PER_PAGE);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
