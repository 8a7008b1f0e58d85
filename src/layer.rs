use crate::entry::{FieldValue, LogEntry};
use crate::error::{Error, Result};
use crate::hook::KinesisHook;
use std::collections::BTreeMap;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Crates that carry our own writes. Events from them are never
/// forwarded, otherwise a record put would log, which would put a record,
/// and so on.
const TRANSPORT_CRATES: &[&str] = &[
    "tracing_kinesis",
    "aws_config",
    "aws_credential_types",
    "aws_runtime",
    "aws_sdk_kinesis",
    "aws_sigv4",
    "aws_smithy_async",
    "aws_smithy_http",
    "aws_smithy_http_client",
    "aws_smithy_json",
    "aws_smithy_observability",
    "aws_smithy_runtime",
    "aws_smithy_runtime_api",
    "aws_smithy_types",
    "aws_types",
    "h2",
    "hyper",
    "hyper_rustls",
    "hyper_util",
    "rustls",
    "tokio_rustls",
    "tower",
];

/// True when `target` is one of [`TRANSPORT_CRATES`] or a module inside
/// one. Matching stops at the crate boundary, so `hyperion::billing` is
/// not `hyper`.
fn is_transport_target(target: &str) -> bool {
    let krate = target.split("::").next().unwrap_or(target);
    TRANSPORT_CRATES.contains(&krate)
}

/// `tracing_subscriber` layer that turns events into [`LogEntry`]s and
/// fires a [`KinesisHook`] for each one whose level the hook accepts.
///
/// Fields of enclosing spans are included, root span first, and are
/// overridden by the event's own fields. In synchronous mode the emitting
/// thread waits for the write; in asynchronous mode the write runs on the
/// runtime captured at construction.
pub struct KinesisLayer {
    hook: KinesisHook,
    handle: Handle,
}

impl KinesisLayer {
    /// Create a layer bound to the current tokio runtime.
    ///
    /// **Returns**
    /// - `Err(Error::NoRuntime)` when called outside a runtime.
    pub fn new(hook: KinesisHook) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self::with_handle(hook, handle))
    }

    /// Create a layer whose writes are driven by `handle`.
    pub fn with_handle(hook: KinesisHook, handle: Handle) -> Self {
        Self { hook, handle }
    }

    /// The hook this layer dispatches to.
    pub fn hook(&self) -> &KinesisHook {
        &self.hook
    }

    fn dispatch(&self, entry: LogEntry) {
        let hook = self.hook.clone();

        if hook.is_async() {
            self.handle.spawn(async move {
                let _ = hook.fire(entry).await;
            });
            return;
        }

        let result = match Handle::try_current() {
            // A current-thread runtime cannot be blocked from inside.
            Ok(current) if current.runtime_flavor() == RuntimeFlavor::CurrentThread => {
                self.handle.spawn(async move {
                    if let Err(e) = hook.send(&entry).await {
                        eprintln!("error sending log record to kinesis: {}", e);
                    }
                });
                return;
            }
            Ok(_) => tokio::task::block_in_place(|| self.handle.block_on(hook.send(&entry))),
            Err(_) => self.handle.block_on(hook.send(&entry)),
        };

        if let Err(e) = result {
            eprintln!("error sending log record to kinesis: {}", e);
        }
    }
}

/// Fields recorded on a span, kept in the span's extensions.
struct SpanFields(BTreeMap<String, FieldValue>);

impl<S> Layer<S> for KinesisLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut fields = BTreeMap::new();
        let mut message = None;
        attrs.record(&mut FieldVisitor { fields: &mut fields, message: &mut message });
        if let Some(message) = message {
            fields.insert(crate::hook::MESSAGE_FIELD.to_string(), FieldValue::Str(message));
        }

        span.extensions_mut().insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut extensions = span.extensions_mut();
        if let Some(SpanFields(fields)) = extensions.get_mut::<SpanFields>() {
            let mut message = None;
            values.record(&mut FieldVisitor { fields: &mut *fields, message: &mut message });
            if let Some(message) = message {
                fields.insert(crate::hook::MESSAGE_FIELD.to_string(), FieldValue::Str(message));
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !self.hook.fires_for(meta.level()) || is_transport_target(meta.target()) {
            return;
        }

        let mut fields = BTreeMap::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanFields(span_fields)) = span.extensions().get::<SpanFields>() {
                    fields.extend(span_fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        let mut message = None;
        event.record(&mut FieldVisitor { fields: &mut fields, message: &mut message });
        // The event's own message outranks one inherited from a span.
        if message.is_some() {
            fields.remove(crate::hook::MESSAGE_FIELD);
        }

        self.dispatch(LogEntry {
            message: message.unwrap_or_default(),
            fields,
        });
    }
}

/// Collects `tracing` field values into [`FieldValue`]s, setting the
/// `message` field aside.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, FieldValue>,
    pub message: &'a mut Option<String>,
}

impl<'a> FieldVisitor<'a> {
    fn insert(&mut self, field: &Field, value: FieldValue) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == crate::hook::MESSAGE_FIELD {
            *self.message = Some(value.to_string());
        } else {
            self.insert(field, FieldValue::Str(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, FieldValue::I64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, FieldValue::U64(value));
    }

    fn record_i128(&mut self, field: &Field, value: i128) {
        let value = i64::try_from(value)
            .map_or_else(|_| FieldValue::Text(value.to_string()), FieldValue::I64);
        self.insert(field, value);
    }

    fn record_u128(&mut self, field: &Field, value: u128) {
        let value = u64::try_from(value)
            .map_or_else(|_| FieldValue::Text(value.to_string()), FieldValue::U64);
        self.insert(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, FieldValue::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, FieldValue::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, FieldValue::error(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == crate::hook::MESSAGE_FIELD {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.insert(field, FieldValue::Text(format!("{:?}", value)));
        }
    }
}
