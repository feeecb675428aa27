//! Byte-ceiling enforcement for archive downloads.

use crate::types::FetchError;

/// Running byte counter that aborts a transfer once a ceiling is crossed.
///
/// One unit serves both checks: the declared `Content-Length` upfront and
/// the streamed body when no length is declared, so the ceiling behaves the
/// same either way.
#[derive(Debug, Clone, Copy)]
pub struct ByteCeiling {
    limit: u64,
    seen: u64,
}

impl ByteCeiling {
    pub fn new(limit: u64) -> Self {
        Self { limit, seen: 0 }
    }

    /// Fails fast on a size the server declares before any body is read.
    pub fn check_declared(&self, declared: u64) -> Result<(), FetchError> {
        if declared > self.limit {
            return Err(FetchError::ArchiveTooLarge { limit: self.limit });
        }
        Ok(())
    }

    /// Counts a streamed chunk, failing the moment the running total crosses
    /// the limit. The caller must abort the transfer on error.
    pub fn count(&mut self, len: usize) -> Result<(), FetchError> {
        self.seen += len as u64;
        if self.seen > self.limit {
            return Err(FetchError::ArchiveTooLarge { limit: self.limit });
        }
        Ok(())
    }
}
