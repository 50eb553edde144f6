use crate::error::Result;
use crate::logger::Logger;
use crate::storage::{DbFile, PAGE_SIZE};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::rc::Rc;

/// Default cache capacity when the caller does not choose one.
pub const DEFAULT_CACHE_SIZE: usize = 64;

/// An in-cache copy of one on-disk page. Owned by the pager; callers see
/// it only through the short-lived handle `get_page` returns.
pub struct Page {
    pub number: usize,
    pub data: Vec<u8>,
    dirty: bool,
}

impl Page {
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Mediates all file access through a bounded LRU cache with write-back:
/// a dirty page is written out only when it is evicted or on
/// `flush_all`, which amortizes I/O for hot pages such as the B-tree
/// root.
pub struct Pager {
    file: DbFile,
    cache: LruCache<usize, Page>,
    cache_size: usize,
    logger: Rc<dyn Logger>,
}

impl Pager {
    /// `cache_size` bounds the number of resident pages; it must be at
    /// least 1.
    pub fn new(file: DbFile, cache_size: usize, logger: Rc<dyn Logger>) -> Self {
        assert!(cache_size > 0, "cache_size must be > 0");
        Pager {
            file,
            cache: LruCache::new(NonZeroUsize::new(cache_size).expect("cache_size checked")),
            cache_size,
            logger,
        }
    }

    /// Returns the cached page, promoting it to most-recently-used, or
    /// loads it from disk. Loading may evict the least-recently-used
    /// page, which is flushed first iff dirty.
    pub fn get_page(&mut self, page_number: usize) -> Result<&mut Page> {
        if self.cache.contains(&page_number) {
            // get_mut refreshes the LRU position.
            return Ok(self
                .cache
                .get_mut(&page_number)
                .expect("cache presence checked"));
        }

        let data = self.file.read_page(page_number)?;
        self.logger
            .debug(&format!("read page {} from disk", page_number));
        let page = Page {
            number: page_number,
            data,
            dirty: false,
        };

        self.evict_if_full()?;
        self.cache.push(page_number, page);
        Ok(self
            .cache
            .get_mut(&page_number)
            .expect("page just inserted"))
    }

    /// Flags the page as modified and refreshes its LRU position, so a
    /// frequently written page is not evicted under read pressure.
    pub fn mark_dirty(&mut self, page_number: usize) {
        if let Some(page) = self.cache.get_mut(&page_number) {
            page.dirty = true;
        }
    }

    /// Writes every dirty page, least recently used first, then clears
    /// the cache.
    pub fn flush_all(&mut self) -> Result<()> {
        while let Some((page_number, page)) = self.cache.pop_lru() {
            if page.dirty {
                self.file.write_page(page_number, &page.data)?;
                self.logger
                    .debug(&format!("flushed dirty page {}", page_number));
            }
        }
        Ok(())
    }

    /// Number of whole pages the backing file currently holds.
    pub fn num_pages(&mut self) -> Result<usize> {
        let size = self.file.size()?;
        Ok(size.div_ceil(PAGE_SIZE as u64) as usize)
    }

    /// Flushes the cache and closes the backing file. Both steps are
    /// attempted even when the flush fails, so a flush error never
    /// leaves the file handle open.
    pub fn close(&mut self) -> Result<()> {
        let flushed = self.flush_all();
        if let Err(err) = &flushed {
            self.logger.error(&format!("flush on close failed: {}", err));
        }
        let closed = self.file.close();
        flushed.and(closed)
    }

    fn evict_if_full(&mut self) -> Result<()> {
        if self.cache.len() < self.cache_size {
            return Ok(());
        }
        if let Some((page_number, page)) = self.cache.pop_lru() {
            if page.dirty {
                self.file.write_page(page_number, &page.data)?;
                self.logger
                    .debug(&format!("evicted dirty page {} (written back)", page_number));
            } else {
                self.logger.debug(&format!("evicted page {}", page_number));
            }
        }
        Ok(())
    }
}
