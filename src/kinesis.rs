use crate::config::Config;
use crate::error::{Error, Result};
use crate::hook::{KinesisHook, KinesisHookBuilder};
use crate::record::StreamRecord;
use crate::sink::RecordSink;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::Client;
use std::sync::Arc;

/// AWS Kinesis implementation of [`RecordSink`]: one `PutRecord` call per
/// record, no batching and no retries beyond what the SDK itself does.
#[derive(Clone, Debug)]
pub struct KinesisSink {
    client: Client,
}

impl KinesisSink {
    /// Wrap an already-built client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolve credentials, region and endpoint from `config` and the
    /// environment, then build a client.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let sdk_config = config.sdk_config().await;
        Self::from_sdk_config(&sdk_config)
    }

    /// Build a client from a caller-supplied SDK configuration.
    ///
    /// **Returns**
    /// - `Err(Error::MissingRegion)` if the configuration names no region.
    /// - `Err(Error::MissingBehaviorVersion)` if no behavior version is set.
    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Result<Self> {
        if sdk_config.region().is_none() {
            return Err(Error::MissingRegion);
        }
        if sdk_config.behavior_version().is_none() {
            return Err(Error::MissingBehaviorVersion);
        }
        Ok(Self::new(Client::new(sdk_config)))
    }
}

#[async_trait]
impl RecordSink for KinesisSink {
    async fn put_record(&self, record: &StreamRecord) -> Result<()> {
        self.client
            .put_record()
            .stream_name(&record.stream_name)
            .partition_key(&record.partition_key)
            .data(Blob::new(record.data.clone()))
            .send()
            .await
            .map_err(aws_sdk_kinesis::Error::from)?;
        Ok(())
    }
}

impl KinesisHook {
    /// Start configuring a hook that writes to Kinesis, defaulting to the
    /// stream `stream_name`, with a client built from `config`.
    pub async fn new(stream_name: impl Into<String>, config: Config) -> Result<KinesisHookBuilder> {
        let sink = KinesisSink::from_config(&config).await?;
        Ok(KinesisHook::builder(stream_name, Arc::new(sink)))
    }

    /// Like [`KinesisHook::new`] but with a ready-made SDK configuration.
    pub fn with_client_config(
        stream_name: impl Into<String>,
        sdk_config: &SdkConfig,
    ) -> Result<KinesisHookBuilder> {
        let sink = KinesisSink::from_sdk_config(sdk_config)?;
        Ok(KinesisHook::builder(stream_name, Arc::new(sink)))
    }
}
