use std::collections::BTreeSet;

/// Filenames that have been successfully ingested into the session's
/// knowledge base. Display-only bookkeeping: the backend owns the real state,
/// this set never shrinks and is never re-validated against the server.
#[derive(Debug, Default)]
pub struct IngestionRegistry {
    filenames: BTreeSet<String>,
}

impl IngestionRegistry {
    /// Merges successfully ingested filenames into the set. Idempotent under
    /// repeated identical input.
    pub fn record_success<I, S>(&mut self, filenames: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for filename in filenames {
            self.filenames.insert(filename.into());
        }
    }

    /// Unique filenames in ascending lexicographic order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &str> {
        self.filenames.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }
}
