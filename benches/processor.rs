use criterion::{black_box, criterion_group, criterion_main, Criterion};
use span_export::{
    ExportResult, SerialSpanProcessor, SpanContext, SpanData, SpanExporter, SpanId, SpanKind,
    SpanProcessor, Status, TraceFlags, TraceId,
};
use std::time::SystemTime;

#[derive(Debug)]
struct NoopSpanExporter;

impl SpanExporter for NoopSpanExporter {
    fn export(
        &self,
        _batch: Vec<SpanData>,
    ) -> impl std::future::Future<Output = ExportResult> + Send {
        std::future::ready(Ok(()))
    }
}

fn test_span(sampled: bool) -> SpanData {
    SpanData {
        span_context: SpanContext::new(
            TraceId::from(1),
            SpanId::from(1),
            TraceFlags::default().with_sampled(sampled),
            false,
        ),
        parent_span_id: SpanId::INVALID,
        span_kind: SpanKind::Internal,
        name: "bench_span".into(),
        start_time: SystemTime::now(),
        end_time: SystemTime::now(),
        attributes: Vec::new(),
        status: Status::Unset,
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("SerialSpanProcessor");

    group.bench_function("on_end_sampled", |b| {
        let processor = SerialSpanProcessor::new(NoopSpanExporter);
        let span = test_span(true);
        b.iter(|| processor.on_end(black_box(span.clone())));
    });

    group.bench_function("on_end_not_sampled", |b| {
        let processor = SerialSpanProcessor::new(NoopSpanExporter);
        let span = test_span(false);
        b.iter(|| processor.on_end(black_box(span.clone())));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().warm_up_time(std::time::Duration::from_secs(1))
                               .measurement_time(std::time::Duration::from_secs(2));
    targets = criterion_benchmark
}

criterion_main!(benches);
