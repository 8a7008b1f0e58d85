//! A `tracing` layer that forwards log events to an AWS Kinesis data
//! stream, one `PutRecord` per event.
//!
//! Build a [`KinesisHook`] (from a [`Config`] or any [`RecordSink`]),
//! wrap it in a [`KinesisLayer`] and add that to a subscriber.

pub mod config;
pub mod entry;
pub mod env;
pub mod error;
pub mod hook;
pub mod init;
pub mod layer;
pub mod memory_sink;
pub mod record;
pub mod sink;

#[cfg(feature = "kinesis")]
pub mod kinesis;

pub use config::{Config, CredentialSource};
pub use entry::{FieldValue, LogEntry};
pub use error::{Error, Result};
pub use hook::{FieldFilter, KinesisHook, KinesisHookBuilder};
pub use layer::KinesisLayer;
pub use memory_sink::MemorySink;
pub use record::StreamRecord;
pub use sink::RecordSink;

#[cfg(feature = "kinesis")]
pub use kinesis::KinesisSink;
