use crate::entry::{FieldValue, LogEntry};
use crate::error::Result;
use crate::record::StreamRecord;
use crate::sink::RecordSink;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::Level;

/// Field that overrides the destination stream of a single entry.
pub const STREAM_NAME_FIELD: &str = "stream_name";

/// Field that overrides the partition key of a single entry.
pub const PARTITION_KEY_FIELD: &str = "partition_key";

/// Field carrying the entry message in the payload.
pub const MESSAGE_FIELD: &str = "message";

/// Levels a new hook fires for.
pub const DEFAULT_LEVELS: [Level; 3] = [Level::ERROR, Level::WARN, Level::INFO];

/// Custom transform applied to one named field before serialization.
pub trait FieldFilter: Send + Sync {
    fn transform(&self, value: FieldValue) -> FieldValue;
}

impl<F> FieldFilter for F
where
    F: Fn(FieldValue) -> FieldValue + Send + Sync,
{
    fn transform(&self, value: FieldValue) -> FieldValue {
        self(value)
    }
}

/// Sends log entries to a record stream, one record per entry.
///
/// A hook is configured through [`KinesisHookBuilder`] and immutable once
/// built, so it can be shared across threads and tasks without locking.
/// Cloning is cheap.
#[derive(Clone)]
pub struct KinesisHook {
    inner: Arc<Inner>,
}

struct Inner {
    sink: Arc<dyn RecordSink>,
    default_stream_name: String,
    default_partition_key: String,
    async_mode: bool,
    levels: Vec<Level>,
    ignore_fields: HashSet<String>,
    filters: HashMap<String, Box<dyn FieldFilter>>,
}

impl KinesisHook {
    /// Start configuring a hook that writes to `sink`, defaulting to the
    /// stream `stream_name`.
    pub fn builder(stream_name: impl Into<String>, sink: Arc<dyn RecordSink>) -> KinesisHookBuilder {
        KinesisHookBuilder {
            inner: Inner {
                sink,
                default_stream_name: stream_name.into(),
                default_partition_key: String::new(),
                async_mode: false,
                levels: DEFAULT_LEVELS.to_vec(),
                ignore_fields: HashSet::new(),
                filters: HashMap::new(),
            },
        }
    }

    /// Levels this hook wants to be invoked for.
    pub fn levels(&self) -> &[Level] {
        &self.inner.levels
    }

    /// Whether entries at `level` are sent.
    pub fn fires_for(&self, level: &Level) -> bool {
        self.inner.levels.contains(level)
    }

    /// Whether [`KinesisHook::fire`] detaches the write.
    pub fn is_async(&self) -> bool {
        self.inner.async_mode
    }

    /// Handle one log entry.
    ///
    /// In synchronous mode the write is awaited and its error returned
    /// unmodified. In asynchronous mode the write runs on a detached task
    /// and this always returns `Ok(())`; the outcome of the write is lost.
    pub async fn fire(&self, entry: LogEntry) -> Result<()> {
        if !self.inner.async_mode {
            return self.send(&entry).await;
        }

        let hook = self.clone();
        tokio::spawn(async move {
            let _ = hook.send(&entry).await;
        });
        Ok(())
    }

    /// Build the record for `entry` and write it once.
    pub async fn send(&self, entry: &LogEntry) -> Result<()> {
        let record = self.record(entry);
        self.inner.sink.put_record(&record).await
    }

    /// Stream name, partition key and payload for `entry`.
    pub fn record(&self, entry: &LogEntry) -> StreamRecord {
        StreamRecord {
            stream_name: self.stream_name(entry).to_string(),
            partition_key: self.partition_key(entry).to_string(),
            data: self.data(entry),
        }
    }

    /// A string `stream_name` field (even empty) wins over the default.
    pub fn stream_name<'a>(&'a self, entry: &'a LogEntry) -> &'a str {
        entry
            .str_field(STREAM_NAME_FIELD)
            .unwrap_or(&self.inner.default_stream_name)
    }

    /// A string `partition_key` field (even empty), else the non-empty
    /// default key, else the entry message.
    pub fn partition_key<'a>(&'a self, entry: &'a LogEntry) -> &'a str {
        if let Some(key) = entry.str_field(PARTITION_KEY_FIELD) {
            return key;
        }
        if !self.inner.default_partition_key.is_empty() {
            return &self.inner.default_partition_key;
        }
        &entry.message
    }

    /// JSON payload for `entry`, keys in lexicographic order.
    ///
    /// Ignored fields are dropped, filtered fields go through their filter
    /// and everything else through [`FieldValue::formatted`]. An entry that
    /// cannot be serialized yields an empty payload.
    pub fn data(&self, entry: &LogEntry) -> Vec<u8> {
        let message = (!entry.fields.contains_key(MESSAGE_FIELD))
            .then(|| (MESSAGE_FIELD, FieldValue::Str(entry.message.clone())));

        let data: BTreeMap<&str, FieldValue> = entry
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .chain(message)
            .filter(|(k, _)| !self.inner.ignore_fields.contains(*k))
            .map(|(k, v)| match self.inner.filters.get(k) {
                Some(filter) => (k, filter.transform(v)),
                None => (k, v.formatted()),
            })
            .collect();

        serde_json::to_vec(&data).unwrap_or_default()
    }
}

impl std::fmt::Debug for KinesisHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut filters: Vec<&String> = self.inner.filters.keys().collect();
        filters.sort();
        f.debug_struct("KinesisHook")
            .field("default_stream_name", &self.inner.default_stream_name)
            .field("default_partition_key", &self.inner.default_partition_key)
            .field("async_mode", &self.inner.async_mode)
            .field("levels", &self.inner.levels)
            .field("ignore_fields", &self.inner.ignore_fields)
            .field("filters", &filters)
            .finish()
    }
}

/// Mutable configuration stage of a [`KinesisHook`].
pub struct KinesisHookBuilder {
    inner: Inner,
}

impl std::fmt::Debug for KinesisHookBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut filters: Vec<&String> = self.inner.filters.keys().collect();
        filters.sort();
        f.debug_struct("KinesisHookBuilder")
            .field("default_stream_name", &self.inner.default_stream_name)
            .field("default_partition_key", &self.inner.default_partition_key)
            .field("async_mode", &self.inner.async_mode)
            .field("levels", &self.inner.levels)
            .field("ignore_fields", &self.inner.ignore_fields)
            .field("filters", &filters)
            .finish()
    }
}

impl KinesisHookBuilder {
    /// Replace the trigger levels wholesale. An empty list means the hook
    /// never fires.
    pub fn levels(mut self, levels: impl IntoIterator<Item = Level>) -> Self {
        self.inner.levels = levels.into_iter().collect();
        self
    }

    /// Default partition key, used when an entry carries none.
    pub fn partition_key(mut self, key: impl Into<String>) -> Self {
        self.inner.default_partition_key = key.into();
        self
    }

    /// Send records from detached tasks; [`KinesisHook::fire`] then never
    /// reports errors.
    pub fn async_mode(mut self) -> Self {
        self.inner.async_mode = true;
        self
    }

    /// Drop the field `name` from every payload. Takes precedence over any
    /// filter registered for the same name.
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.inner.ignore_fields.insert(name.into());
        self
    }

    /// Transform the field `name` with `filter` instead of the default
    /// formatting. Re-registering a name replaces the previous filter.
    pub fn filter<F>(self, name: impl Into<String>, filter: F) -> Self
    where
        F: Fn(FieldValue) -> FieldValue + Send + Sync + 'static,
    {
        self.filter_with(name, filter)
    }

    /// Like [`KinesisHookBuilder::filter`] for any [`FieldFilter`].
    pub fn filter_with(mut self, name: impl Into<String>, filter: impl FieldFilter + 'static) -> Self {
        self.inner.filters.insert(name.into(), Box::new(filter));
        self
    }

    /// Freeze the configuration into a shareable hook.
    pub fn build(self) -> KinesisHook {
        KinesisHook {
            inner: Arc::new(self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_sink::MemorySink;

    const ENTRY_MESSAGE: &str = "entry_message";

    fn builder(stream: &str) -> KinesisHookBuilder {
        KinesisHook::builder(stream, Arc::new(MemorySink::new()))
    }

    fn data_string(hook: &KinesisHook, entry: &LogEntry) -> String {
        String::from_utf8(hook.data(entry)).unwrap()
    }

    #[test]
    fn levels_default_and_replace() {
        assert_eq!(builder("s").build().levels(), &DEFAULT_LEVELS);

        let cases: Vec<Vec<Level>> = vec![
            vec![],
            vec![Level::WARN],
            vec![Level::ERROR],
            vec![Level::WARN, Level::DEBUG],
            vec![Level::WARN, Level::DEBUG, Level::ERROR],
        ];
        for levels in cases {
            let hook = builder("s").levels(levels.clone()).build();
            assert_eq!(hook.levels(), levels.as_slice());
            for level in [Level::TRACE, Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR] {
                assert_eq!(hook.fires_for(&level), levels.contains(&level), "{:?}", level);
            }
        }
    }

    #[test]
    fn ignore_is_a_set() {
        let hook = builder("s").ignore("foo").ignore("bar").ignore("foo").build();
        assert_eq!(hook.inner.ignore_fields.len(), 2);
        assert!(hook.inner.ignore_fields.contains("foo"));
        assert!(hook.inner.ignore_fields.contains("bar"));
    }

    #[test]
    fn filter_re_registration_overwrites() {
        let hook = builder("s")
            .filter("price", |_| FieldValue::Str("first".into()))
            .filter("price", |_| FieldValue::Str("second".into()))
            .build();
        assert_eq!(hook.inner.filters.len(), 1);

        let entry = LogEntry::new(ENTRY_MESSAGE).with_field("price", 105);
        assert_eq!(
            data_string(&hook, &entry),
            r#"{"message":"entry_message","price":"second"}"#
        );
    }

    #[test]
    fn stream_name_resolution() {
        let cases: Vec<(Option<FieldValue>, &str, &str)> = vec![
            (Some("entry_stream".into()), "default_stream", "entry_stream"),
            (Some("entry_stream".into()), "", "entry_stream"),
            (Some("".into()), "default_stream", ""),
            (Some("".into()), "", ""),
            (Some(99999.into()), "default_stream", "default_stream"),
            (Some(FieldValue::Null), "default_stream", "default_stream"),
            (None, "default_stream", "default_stream"),
            (None, "", ""),
        ];

        for (field, default, expected) in cases {
            let hook = builder(default).build();
            let mut entry = LogEntry::new(ENTRY_MESSAGE);
            if let Some(value) = field.clone() {
                entry = entry.with_field(STREAM_NAME_FIELD, value);
            }
            assert_eq!(hook.stream_name(&entry), expected, "{:?} / {:?}", field, default);
        }
    }

    #[test]
    fn partition_key_resolution() {
        let cases: Vec<(Option<FieldValue>, &str, &str, &str)> = vec![
            (Some("entry_key".into()), "default_key", "message_key", "entry_key"),
            (Some("entry_key".into()), "default_key", "", "entry_key"),
            (Some("entry_key".into()), "", "message_key", "entry_key"),
            (Some("entry_key".into()), "", "", "entry_key"),
            (Some("".into()), "default_key", "message_key", ""),
            (Some("".into()), "default_key", "", ""),
            (Some("".into()), "", "message_key", ""),
            (Some("".into()), "", "", ""),
            (Some(99999.into()), "default_key", "message_key", "default_key"),
            (Some(FieldValue::Null), "default_key", "message_key", "default_key"),
            (Some(99999.into()), "default_key", "", "default_key"),
            (Some(FieldValue::Null), "default_key", "", "default_key"),
            (Some(99999.into()), "", "message_key", "message_key"),
            (Some(FieldValue::Null), "", "message_key", "message_key"),
            (None, "default_key", "message_key", "default_key"),
            (None, "default_key", "", "default_key"),
            (None, "", "message_key", "message_key"),
            (None, "", "", ""),
        ];

        for (field, default, message, expected) in cases {
            let hook = builder("s").partition_key(default).build();
            let mut entry = LogEntry::new(message);
            if let Some(value) = field.clone() {
                entry = entry.with_field(PARTITION_KEY_FIELD, value);
            }
            assert_eq!(
                hook.partition_key(&entry),
                expected,
                "{:?} / {:?} / {:?}",
                field,
                default,
                message
            );
        }
    }

    #[test]
    fn data_adds_message_and_sorts_keys() {
        let hook = builder("s").build();

        let empty = LogEntry::new(ENTRY_MESSAGE);
        assert_eq!(data_string(&hook, &empty), r#"{"message":"entry_message"}"#);

        let overridden = empty.clone().with_field("message", "field_message");
        assert_eq!(data_string(&hook, &overridden), r#"{"message":"field_message"}"#);

        let fruit = empty
            .clone()
            .with_field("name", "apple")
            .with_field("price", 105)
            .with_field("color", "red");
        assert_eq!(
            data_string(&hook, &fruit),
            r#"{"color":"red","message":"entry_message","name":"apple","price":105}"#
        );

        let fruit = fruit.with_field("message", "field_message");
        assert_eq!(
            data_string(&hook, &fruit),
            r#"{"color":"red","message":"field_message","name":"apple","price":105}"#
        );
    }

    #[test]
    fn ignore_wins_over_filter() {
        let hook = builder("s")
            .ignore("secret")
            .filter("secret", |_| FieldValue::Str("masked".into()))
            .filter("name", |v| match v {
                FieldValue::Str(s) => FieldValue::Str(s.to_uppercase()),
                other => other,
            })
            .build();
        let entry = LogEntry::new(ENTRY_MESSAGE)
            .with_field("secret", "hunter2")
            .with_field("name", "apple");

        assert_eq!(
            data_string(&hook, &entry),
            r#"{"message":"entry_message","name":"APPLE"}"#
        );
    }

    struct Redact;

    impl FieldFilter for Redact {
        fn transform(&self, _value: FieldValue) -> FieldValue {
            FieldValue::Str("[redacted]".into())
        }
    }

    #[test]
    fn filter_trait_objects() {
        let hook = builder("s").filter_with("token", Redact).build();
        let entry = LogEntry::new(ENTRY_MESSAGE).with_field("token", "abc");
        assert_eq!(
            data_string(&hook, &entry),
            r#"{"message":"entry_message","token":"[redacted]"}"#
        );
    }

    fn mask_tail(value: FieldValue) -> FieldValue {
        match value {
            FieldValue::Str(s) => match s.char_indices().rev().nth(3) {
                Some((start, _)) if start > 0 => FieldValue::Str(format!("****{}", &s[start..])),
                _ => FieldValue::Str(s),
            },
            other => other,
        }
    }

    #[test]
    fn masking_filter_keeps_multibyte_tails_whole() {
        let hook = builder("s").filter("card", mask_tail).build();
        let cases = [
            ("4111111111111111", "****1111"),
            ("ñandú", "****andú"),
            ("カード番号", "****ード番号"),
            ("abcd", "abcd"),
            ("ab", "ab"),
        ];
        for (input, masked) in cases {
            let entry = LogEntry::new(ENTRY_MESSAGE).with_field("card", input);
            assert_eq!(
                data_string(&hook, &entry),
                format!(r#"{{"card":"{}","message":"entry_message"}}"#, masked),
                "{}",
                input
            );
        }
    }

    #[test]
    fn ignoring_message_drops_it() {
        let hook = builder("s").ignore(MESSAGE_FIELD).build();
        let entry = LogEntry::new(ENTRY_MESSAGE).with_field("a", 1);
        assert_eq!(data_string(&hook, &entry), r#"{"a":1}"#);
    }

    #[test]
    fn default_formatting_of_rich_values() {
        let hook = builder("s").build();
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let entry = LogEntry::new(ENTRY_MESSAGE)
            .with_field("err", FieldValue::error(&err))
            .with_field("addr", FieldValue::display(std::net::Ipv4Addr::LOCALHOST))
            .with_field("obj", serde_json::json!({"b": 1, "a": [true]}));

        assert_eq!(
            data_string(&hook, &entry),
            r#"{"addr":"127.0.0.1","err":"disk on fire","message":"entry_message","obj":{"a":[true],"b":1}}"#
        );
    }

    #[test]
    fn unserializable_entry_yields_empty_payload() {
        let hook = builder("s").build();
        let entry = LogEntry::new(ENTRY_MESSAGE).with_field("ratio", f64::NAN);
        assert!(hook.data(&entry).is_empty());

        let hook = builder("s").ignore("ratio").build();
        assert_eq!(data_string(&hook, &entry), r#"{"message":"entry_message"}"#);
    }

    #[tokio::test]
    async fn sync_fire_writes_one_record() {
        let sink = MemorySink::new();
        let hook = KinesisHook::builder("default_stream", Arc::new(sink.clone()))
            .partition_key("pk")
            .build();
        let entry = LogEntry::new(ENTRY_MESSAGE).with_field("n", 1);

        hook.fire(entry).await.unwrap();

        assert_eq!(
            sink.records(),
            vec![StreamRecord {
                stream_name: "default_stream".into(),
                partition_key: "pk".into(),
                data: br#"{"message":"entry_message","n":1}"#.to_vec(),
            }]
        );
    }

    #[tokio::test]
    async fn sync_fire_returns_sink_error() {
        let sink = MemorySink::new();
        sink.set_failing(true);
        let hook = KinesisHook::builder("s", Arc::new(sink.clone())).build();

        let err = hook.fire(LogEntry::new("m")).await.unwrap_err();
        assert!(matches!(err, crate::Error::Sink(_)));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn async_fire_never_reports_errors() {
        let sink = MemorySink::new();
        sink.set_failing(true);
        let hook = KinesisHook::builder("s", Arc::new(sink.clone()))
            .async_mode()
            .build();
        assert!(hook.is_async());

        assert!(hook.fire(LogEntry::new("m")).await.is_ok());
    }

    #[tokio::test]
    async fn async_fire_eventually_writes() {
        let sink = MemorySink::new();
        let hook = KinesisHook::builder("s", Arc::new(sink.clone()))
            .async_mode()
            .build();

        hook.fire(LogEntry::new("m")).await.unwrap();

        for _ in 0..100 {
            if sink.len() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.records()[0].partition_key, "m");
    }
}
