use crate::error::{ExportError, ExportResult};
use crate::export::SpanExporter;
use crate::span::SpanData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An in-memory span exporter that stores exported span data in memory.
///
/// This exporter is useful for testing and debugging purposes. Spans are
/// stored in a `Vec<SpanData>` and can be retrieved using the
/// [`get_finished_spans`](InMemorySpanExporter::get_finished_spans) method.
///
/// # Example
///
/// ```
/// use span_export::{InMemorySpanExporter, SerialSpanProcessor, SpanProcessor};
///
/// let exporter = InMemorySpanExporter::default();
/// let processor = SerialSpanProcessor::new(exporter.clone());
///
/// // ... end spans through the processor ...
///
/// processor.force_flush().unwrap();
/// for span in exporter.get_finished_spans().unwrap() {
///     println!("{span:?}")
/// }
/// ```
#[derive(Clone, Debug)]
pub struct InMemorySpanExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
    force_flush_calls: Arc<AtomicUsize>,
    shutdown_calls: Arc<AtomicUsize>,
    should_reset_on_shutdown: bool,
}

impl Default for InMemorySpanExporter {
    fn default() -> Self {
        InMemorySpanExporterBuilder::new().build()
    }
}

/// Builder for [`InMemorySpanExporter`].
///
/// # Example
///
/// ```
/// use span_export::InMemorySpanExporterBuilder;
///
/// let exporter = InMemorySpanExporterBuilder::new().build();
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemorySpanExporterBuilder {
    keep_spans_on_shutdown: bool,
}

impl InMemorySpanExporterBuilder {
    /// Creates a new instance of the builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the stored spans when `shutdown` is called, instead of clearing
    /// them. Useful for tests that assert on spans exported before
    /// shutdown.
    pub fn keep_spans_on_shutdown(mut self) -> Self {
        self.keep_spans_on_shutdown = true;
        self
    }

    /// Creates a new instance of the [`InMemorySpanExporter`].
    pub fn build(&self) -> InMemorySpanExporter {
        InMemorySpanExporter {
            spans: Arc::new(Mutex::new(Vec::new())),
            force_flush_calls: Arc::new(AtomicUsize::new(0)),
            shutdown_calls: Arc::new(AtomicUsize::new(0)),
            should_reset_on_shutdown: !self.keep_spans_on_shutdown,
        }
    }
}

impl InMemorySpanExporter {
    /// Returns the finished spans as a vector of `SpanData`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] if the internal lock cannot be acquired.
    pub fn get_finished_spans(&self) -> Result<Vec<SpanData>, ExportError> {
        self.spans
            .lock()
            .map(|spans_guard| spans_guard.iter().cloned().collect())
            .map_err(ExportError::from)
    }

    /// Clears the internal storage of finished spans.
    pub fn reset(&self) {
        let _ = self.spans.lock().map(|mut spans_guard| spans_guard.clear());
    }

    /// How many times `force_flush` was invoked on this exporter.
    pub fn force_flush_calls(&self) -> usize {
        self.force_flush_calls.load(Ordering::SeqCst)
    }

    /// How many times `shutdown` was invoked on this exporter.
    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }
}

impl SpanExporter for InMemorySpanExporter {
    fn export(
        &self,
        mut batch: Vec<SpanData>,
    ) -> impl std::future::Future<Output = ExportResult> + Send {
        let result = self
            .spans
            .lock()
            .map(|mut spans_guard| spans_guard.append(&mut batch))
            .map_err(|err| ExportError::InternalFailure(format!("failed to lock spans: {err:?}")));
        std::future::ready(result)
    }

    fn force_flush(&self) -> ExportResult {
        self.force_flush_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown_with_timeout(&self, _timeout: Duration) -> ExportResult {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_reset_on_shutdown {
            self.reset();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{SpanContext, SpanId, SpanKind, Status, TraceFlags, TraceId};
    use std::time::SystemTime;

    fn span(name: &str) -> SpanData {
        SpanData {
            span_context: SpanContext::new(
                TraceId::from(1),
                SpanId::from(1),
                TraceFlags::SAMPLED,
                false,
            ),
            parent_span_id: SpanId::INVALID,
            span_kind: SpanKind::Internal,
            name: name.to_string().into(),
            start_time: SystemTime::now(),
            end_time: SystemTime::now(),
            attributes: Vec::new(),
            status: Status::Unset,
        }
    }

    #[test]
    fn stores_and_resets_spans() {
        let exporter = InMemorySpanExporter::default();
        futures_executor::block_on(exporter.export(vec![span("a"), span("b")])).unwrap();

        assert_eq!(exporter.get_finished_spans().unwrap().len(), 2);
        exporter.reset();
        assert!(exporter.get_finished_spans().unwrap().is_empty());
    }

    #[test]
    fn shutdown_clears_spans_unless_kept() {
        let exporter = InMemorySpanExporter::default();
        futures_executor::block_on(exporter.export(vec![span("a")])).unwrap();
        exporter.shutdown().unwrap();
        assert!(exporter.get_finished_spans().unwrap().is_empty());
        assert_eq!(exporter.shutdown_calls(), 1);

        let keeping = InMemorySpanExporterBuilder::new()
            .keep_spans_on_shutdown()
            .build();
        futures_executor::block_on(keeping.export(vec![span("a")])).unwrap();
        keeping.shutdown().unwrap();
        assert_eq!(keeping.get_finished_spans().unwrap().len(), 1);
    }
}
