use super::guest::{Guest, Handler};
use crate::error::{Error, Result};
use crate::Core::memory::MAX_PAGES;

/// Sizing of a guest's memory space and response writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestConfig {
    /// Pages of linear memory present at start.
    pub initial_pages: u32,
    /// Upper bound on pages; allocations beyond it fail.
    pub max_pages: u32,
    /// Bytes preallocated for encoding responses.
    pub writer_capacity: usize,
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            initial_pages: 1,
            max_pages: 256, // 16MB
            writer_capacity: 20 * 1024,
        }
    }
}

pub struct GuestBuilder {
    config: GuestConfig,
}

impl Default for GuestBuilder {
    fn default() -> Self {
        Self {
            config: GuestConfig::default(),
        }
    }
}

impl GuestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_pages(mut self, pages: u32) -> Self {
        self.config.initial_pages = pages;
        self
    }

    pub fn with_max_pages(mut self, pages: u32) -> Self {
        self.config.max_pages = pages;
        self
    }

    pub fn with_writer_capacity(mut self, bytes: usize) -> Self {
        self.config.writer_capacity = bytes;
        self
    }

    pub fn config(&self) -> &GuestConfig {
        &self.config
    }

    pub fn build<H: Handler>(self, handler: H) -> Result<Guest<H>> {
        let GuestConfig {
            initial_pages,
            max_pages,
            ..
        } = self.config;
        if max_pages > MAX_PAGES {
            return Err(Error::InvalidConfig(format!(
                "max_pages {} exceeds {}",
                max_pages, MAX_PAGES
            )));
        }
        if initial_pages > max_pages {
            return Err(Error::InvalidConfig(format!(
                "initial_pages {} larger than max_pages {}",
                initial_pages, max_pages
            )));
        }
        Guest::new(self.config, handler)
    }
}
