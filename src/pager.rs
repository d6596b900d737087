//! Page cache over the backing file.
//!
//! Pages are loaded lazily into owned 4 KiB buffers and stay cached until
//! the pager is closed. Page `n` lives at file offset `n * PAGE_SIZE`.

use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::Path,
};

use tracing::debug;

use crate::{
    MAX_CONFIGURABLE_PAGES, PAGE_SIZE,
    error::{DbError, Result},
};

pub type Page = [u8; PAGE_SIZE];

#[derive(Debug)]
pub struct Pager {
    file: File,
    file_length: u64,
    pages: Vec<Option<Box<Page>>>,
}

impl Pager {
    pub fn open(path: &Path, max_pages: usize) -> Result<Self> {
        if !(1..=MAX_CONFIGURABLE_PAGES).contains(&max_pages) {
            return Err(DbError::InvalidPageLimit {
                max_pages,
                limit: MAX_CONFIGURABLE_PAGES,
            });
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let file_length = file.metadata()?.len();
        debug!(path = %path.display(), file_length, max_pages, "opened pager");

        Ok(Self {
            file,
            file_length,
            pages: (0..max_pages).map(|_| None).collect(),
        })
    }

    /// Length of the backing file when it was opened.
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    pub fn max_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn is_loaded(&self, page_num: usize) -> bool {
        matches!(self.pages.get(page_num), Some(Some(_)))
    }

    /// Returns the cached buffer for `page_num`, reading it from disk (or
    /// zero-filling it past the end of the file) on first access.
    pub fn get_page(&mut self, page_num: usize) -> Result<&mut Page> {
        let max_pages = self.max_pages();
        if page_num >= max_pages {
            return Err(DbError::PageOutOfBounds {
                page_num,
                max_pages,
            });
        }

        let page = match self.pages[page_num].take() {
            Some(page) => page,
            None => self.load_page(page_num)?,
        };
        Ok(&mut **self.pages[page_num].insert(page))
    }

    fn load_page(&mut self, page_num: usize) -> Result<Box<Page>> {
        let mut page: Box<Page> = Box::new([0u8; PAGE_SIZE]);

        // Count a trailing partial page as present on disk.
        let pages_on_disk = self.file_length.div_ceil(PAGE_SIZE as u64);
        if (page_num as u64) < pages_on_disk {
            self.file
                .seek(SeekFrom::Start((page_num * PAGE_SIZE) as u64))?;
            let bytes_read = read_up_to(&mut self.file, &mut page[..])?;
            debug!(page_num, bytes_read, "loaded page from disk");
        } else {
            debug!(page_num, "allocated new page");
        }

        Ok(page)
    }

    /// Writes the first `byte_count` bytes of a cached page back to its
    /// file offset.
    pub fn flush(&mut self, page_num: usize, byte_count: usize) -> Result<()> {
        let page = self
            .pages
            .get(page_num)
            .and_then(|slot| slot.as_deref())
            .ok_or(DbError::FlushAbsentPage(page_num))?;

        self.file
            .seek(SeekFrom::Start((page_num * PAGE_SIZE) as u64))?;
        self.file.write_all(&page[..byte_count.min(PAGE_SIZE)])?;
        debug!(page_num, byte_count, "flushed page");
        Ok(())
    }

    /// Releases every cached buffer and the file handle, surfacing any
    /// error the OS reports while syncing.
    pub fn close(mut self) -> Result<()> {
        self.pages.clear();
        self.file.sync_all()?;
        debug!("closed pager");
        Ok(())
    }
}

/// Fills `buf` from the current position, stopping early at end of file.
fn read_up_to(file: &mut File, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
