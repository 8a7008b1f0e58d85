use crate::error::Result;
use crate::record::StreamRecord;
use async_trait::async_trait;

/// Destination for [`StreamRecord`]s produced by the hook.
///
/// Implementations transport a record to a concrete stream service (AWS
/// Kinesis, an in-memory buffer for tests, etc). The hook calls
/// `put_record` exactly once per fired log entry and never retries.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Submit a single record.
    ///
    /// **Parameters**
    /// - `record`: stream name, partition key and payload built by the hook.
    ///
    /// **Returns**
    /// - `Ok(())` if the service accepted the record.
    /// - `Err(..)` with the service or transport error, unmodified. In
    ///   synchronous mode this becomes the result of the fire call; in
    ///   asynchronous mode it is discarded.
    async fn put_record(&self, record: &StreamRecord) -> Result<()>;
}
