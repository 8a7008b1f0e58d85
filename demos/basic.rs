use tracing::{error, info, warn};
use tracing_kinesis::init::init_tracing;
use tracing_kinesis::{Config, KinesisHook, KinesisLayer};

/// Sends every INFO and above event to the `app-logs` stream. Credentials,
/// region and endpoint come from the environment (`AWS_ACCESS_KEY_ID`,
/// `AWS_REGION`, `AWS_ENDPOINT`, ...) or `~/.aws/credentials`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let hook = KinesisHook::new("app-logs", Config::default())
        .await?
        .partition_key("basic-demo")
        .build();

    init_tracing(KinesisLayer::new(hook)?)?;

    info!(name = "apple", price = 105, color = "red", "fruit priced");
    warn!(stream_name = "app-audit", user = "alice", "login from new device");
    error!(partition_key = "orders", order_id = 42u64, "payment declined");

    Ok(())
}
