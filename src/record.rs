/// The inputs of one put-record call: destination stream, partition key
/// and the JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    pub stream_name: String,
    pub partition_key: String,
    pub data: Vec<u8>,
}
