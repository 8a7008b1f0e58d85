use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{error, Level};
use tracing_kinesis::init::{init_tracing_with_config, InitConfig};
use tracing_kinesis::{Config, FieldValue, KinesisHook, KinesisLayer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config {
        region: Some("ap-northeast-1".to_string()),
        endpoint: std::env::var("KINESIS_DEMO_ENDPOINT").ok(),
        ..Default::default()
    };

    let hook = KinesisHook::new("app-errors", config)
        .await?
        .levels([Level::ERROR])
        .async_mode()
        .ignore("password")
        .filter("card_number", |v| match v {
            FieldValue::Str(s) => match s.char_indices().rev().nth(3) {
                Some((start, _)) if start > 0 => FieldValue::Str(format!("****{}", &s[start..])),
                _ => FieldValue::Str(s),
            },
            other => other,
        })
        .build();

    init_tracing_with_config(KinesisLayer::new(hook)?, InitConfig { enable_stdout: false })?;

    let n: u64 = 1_000;
    let start = Instant::now();

    for i in 0..n {
        error!(
            iteration = i,
            card_number = "4111111111111111",
            password = "hunter2",
            "async fire demo error"
        );
    }

    let elapsed = start.elapsed();
    println!("fired {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Detached writes are not awaited by anyone.
    sleep(Duration::from_secs(2)).await;
    Ok(())
}
