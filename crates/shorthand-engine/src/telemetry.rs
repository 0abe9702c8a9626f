// SPDX-License-Identifier: Apache-2.0 OR MIT
#![cfg_attr(not(feature = "telemetry"), allow(dead_code))]

#[cfg(feature = "telemetry")]
mod otel {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::OnceLock;
    use std::time::Duration;

    use opentelemetry::global;
    use opentelemetry::metrics::{Counter, Histogram};
    use opentelemetry::trace::{Span, SpanKind, Tracer};
    use opentelemetry::KeyValue;

    const METER_NAME: &str = "shorthand_engine";
    const TRACER_NAME: &str = "shorthand_engine";

    static ENABLED: AtomicBool = AtomicBool::new(false);
    static HANDLES: OnceLock<Handles> = OnceLock::new();

    struct Handles {
        tracer: opentelemetry::global::BoxedTracer,
        parse_hist: Histogram<f64>,
        process_hist: Histogram<f64>,
        parse_counter: Counter<u64>,
        process_counter: Counter<u64>,
    }

    impl Handles {
        fn new() -> Self {
            let meter = global::meter(METER_NAME);
            let parse_hist = meter
                .f64_histogram("shorthand.parse.duration_ms")
                .with_description("Template parse duration in milliseconds")
                .init();
            let process_hist = meter
                .f64_histogram("shorthand.process.duration_ms")
                .with_description("Match duration in milliseconds")
                .init();
            let parse_counter = meter
                .u64_counter("shorthand.parse.count")
                .with_description("Number of template parses")
                .init();
            let process_counter = meter
                .u64_counter("shorthand.process.count")
                .with_description("Number of match attempts")
                .init();
            let tracer = global::tracer(TRACER_NAME);
            Self {
                tracer,
                parse_hist,
                process_hist,
                parse_counter,
                process_counter,
            }
        }
    }

    fn handles() -> &'static Handles {
        HANDLES.get_or_init(Handles::new)
    }

    pub fn enable() {
        ENABLED.store(true, Ordering::Relaxed);
    }

    pub fn disable() {
        ENABLED.store(false, Ordering::Relaxed);
    }

    fn enabled() -> bool {
        ENABLED.load(Ordering::Relaxed)
    }

    pub fn record_parse(template_len: usize, duration: Duration, success: bool) {
        if !enabled() {
            return;
        }
        let hs = handles();
        let duration_ms = duration.as_secs_f64() * 1_000.0;
        let attrs = [
            KeyValue::new("template.length", template_len as i64),
            KeyValue::new("parse.success", success),
        ];
        hs.parse_counter.add(1, &attrs);
        hs.parse_hist.record(duration_ms, &attrs);
    }

    pub fn record_process(template_len: usize, duration: Duration, success: bool) {
        if !enabled() {
            return;
        }
        let hs = handles();
        let duration_ms = duration.as_secs_f64() * 1_000.0;
        let attrs = [
            KeyValue::new("template.length", template_len as i64),
            KeyValue::new("process.success", success),
        ];
        hs.process_counter.add(1, &attrs);
        hs.process_hist.record(duration_ms, &attrs);
        let mut span = hs
            .tracer
            .span_builder("ShorthandTemplate::process")
            .with_kind(SpanKind::Internal)
            .start(&hs.tracer);
        span.set_attribute(KeyValue::new("template.length", template_len as i64));
        span.set_attribute(KeyValue::new("process.duration_ms", duration_ms));
        span.set_attribute(KeyValue::new("process.success", success));
        span.end();
    }
}

#[cfg(not(feature = "telemetry"))]
mod otel {
    use std::time::Duration;

    pub fn enable() {}
    pub fn disable() {}
    pub fn record_parse(_template_len: usize, _duration: Duration, _success: bool) {}
    pub fn record_process(_template_len: usize, _duration: Duration, _success: bool) {}
}

pub use otel::{disable, enable, record_parse, record_process};
