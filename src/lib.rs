//! # Serialized Span Export Pipeline
//!
//! This crate is the export half of a tracing pipeline: a span processor
//! that forwards each finished span to a pluggable [`SpanExporter`], while
//! guaranteeing that exporter operations requested from overlapping code
//! paths (span end, explicit flush, shutdown, and calls the exporter
//! itself re-triggers) never run concurrently, execute in arrival order,
//! and are never lost.
//!
//! The heart of the crate is [`SerialSpanProcessor`]: requests are queued
//! as deferred exporter operations, and the first call to find the queue
//! idle becomes the drain owner, running queued operations one at a time
//! until the queue is empty - including operations queued by other threads
//! or by the exporter itself while the drain is running. Only the drain
//! owner observes an outcome; every other caller returns immediately.
//!
//! Exporters implement the [`SpanExporter`] trait. An [`InMemorySpanExporter`]
//! is provided for tests behind the `testing` feature. Internal diagnostics
//! are emitted through the `diag_debug!`/`diag_warn!`/`diag_error!` macros,
//! which forward to [`tracing`] when the `internal-logs` feature (default)
//! is enabled.
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(test, deny(warnings))]

mod error;
mod export;
#[cfg(any(feature = "testing", test))]
mod in_memory_exporter;
mod internal_logging;
mod processor;
mod span;

pub use error::{ExportError, ExportResult};
pub use export::{SpanExporter, DEFAULT_SHUTDOWN_TIMEOUT};
#[cfg(any(feature = "testing", test))]
pub use in_memory_exporter::{InMemorySpanExporter, InMemorySpanExporterBuilder};
pub use processor::{SerialSpanProcessor, SerialSpanProcessorBuilder, SpanProcessor};
pub use span::{
    Key, KeyValue, SpanContext, SpanData, SpanId, SpanKind, Status, TraceFlags, TraceId, Value,
};

#[cfg(feature = "internal-logs")]
#[doc(hidden)]
pub mod _private {
    pub use tracing::{debug, error, warn};
}
