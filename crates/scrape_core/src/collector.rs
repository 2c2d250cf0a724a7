/// Append-only, insertion-ordered accumulation of records for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Collector<T> {
    records: Vec<T>,
}

impl<T> Collector<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: T) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True once at least `target` records have been collected.
    pub fn reached(&self, target: usize) -> bool {
        self.records.len() >= target
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}

impl<T> Default for Collector<T> {
    fn default() -> Self {
        Self::new()
    }
}
