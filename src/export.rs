//! Span exporter contract.
use crate::error::ExportResult;
use crate::span::SpanData;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

/// Default timeout applied by [`SpanExporter::shutdown`] and
/// [`crate::SpanProcessor::shutdown`] when no explicit timeout is given.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// `SpanExporter` defines the interface that protocol-specific exporters
/// must implement so they can be plugged into the pipeline and support
/// sending of span data.
///
/// The goal of the interface is to minimize the burden of implementation
/// for protocol-dependent exporters. An exporter is expected to be
/// primarily a simple encoder and transmitter of span data.
pub trait SpanExporter: Send + Sync + Debug {
    /// Exports a batch of finished spans. Protocol exporters that implement
    /// this function are typically expected to serialize and transmit the
    /// data to the destination.
    ///
    /// This function is never called concurrently for the same exporter
    /// instance: the processor runs exporter operations one at a time, and
    /// a new call begins only after the current one returns.
    ///
    /// This function must not block indefinitely; there must be a
    /// reasonable upper limit after which the call times out with an error
    /// result. Any retry logic that is required is the responsibility of
    /// the exporter.
    fn export(&self, batch: Vec<SpanData>) -> impl Future<Output = ExportResult> + Send;

    /// A hint that any spans the exporter has buffered internally should be
    /// sent to the destination as soon as possible, preferably before this
    /// method returns.
    fn force_flush(&self) -> ExportResult {
        Ok(())
    }

    /// Shuts down the exporter within the given timeout. After this call,
    /// further `export` calls are not allowed and should return an error.
    ///
    /// Honoring `timeout` is the exporter's responsibility; the processor
    /// only passes it through.
    fn shutdown_with_timeout(&self, _timeout: Duration) -> ExportResult {
        Ok(())
    }

    /// Shuts down the exporter with the default timeout.
    fn shutdown(&self) -> ExportResult {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }
}
