use super::format::ArchiveEntry;

/// Observer for per-entry progress during pack, unpack and verify.
///
/// All methods default to doing nothing.
pub trait Progress {
    /// Called once with the number of entries about to be processed.
    fn start(&mut self, _total: u32) {}

    /// Called after entry `index` (1-based) has been handled.
    fn entry(&mut self, _index: u32, _total: u32, _entry: &ArchiveEntry) {}

    /// Called when unpack leaves an existing file alone.
    fn skipped(&mut self, _entry: &ArchiveEntry) {}

    fn finish(&mut self) {}
}

/// Progress sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {}
