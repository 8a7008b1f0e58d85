use crate::error::{Error, Result};
use crate::record::StreamRecord;
use crate::sink::RecordSink;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A sink that keeps every record in memory.
///
/// Useful for unit tests and for trying out hook configuration without an
/// AWS account. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<StreamRecord>>>,
    failing: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Records accepted so far.
    pub fn records(&self) -> Vec<StreamRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StreamRecord>> {
        // A panic while holding the lock leaves the Vec intact.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn put_record(&self, record: &StreamRecord) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::sink(format!(
                "memory sink rejected record for stream {:?}",
                record.stream_name
            )));
        }
        self.lock().push(record.clone());
        Ok(())
    }
}
