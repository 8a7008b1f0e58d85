use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use tracing_kinesis::{init::init_tracing, KinesisHook, KinesisLayer, RecordSink, StreamRecord};

/// Example of routing records somewhere other than Kinesis by implementing
/// `RecordSink` directly. Here the "stream" is stdout.
struct StdoutSink;

#[async_trait]
impl RecordSink for StdoutSink {
    async fn put_record(&self, record: &StreamRecord) -> tracing_kinesis::Result<()> {
        println!(
            "[{}/{}] {}",
            record.stream_name,
            record.partition_key,
            String::from_utf8_lossy(&record.data)
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink: Arc<dyn RecordSink> = Arc::new(StdoutSink);
    let hook = KinesisHook::builder("stdout-stream", sink).build();

    init_tracing(KinesisLayer::new(hook)?)?;

    info!("custom sink example started");
    error!(db = "orders", "simulated error sent via custom sink");
    Ok(())
}
