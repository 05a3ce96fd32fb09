//! Stage spans and candidate-count events for the decode pipeline.
//!
//! Everything is emitted under the `yolo_post` target so one `EnvFilter`
//! directive covers it. Without the `tracing` feature the macros expand to
//! nothing but still evaluate their field values.

/// Span around one pipeline stage (decode, suppress, dispatch).
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($stage:expr $(, $($field:tt)*)?) => {
        tracing::info_span!(target: "yolo_post", $stage $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($stage:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Info event reporting how many candidates a stage produced.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($what:expr $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::event!(
            target: "yolo_post",
            tracing::Level::INFO,
            what = $what
            $(, $key = $value)*
        )
    };
}

/// Debug event for a single candidate dropped as malformed.
#[cfg(feature = "tracing")]
macro_rules! trace_skip {
    ($why:expr $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::event!(
            target: "yolo_post",
            tracing::Level::DEBUG,
            why = $why
            $(, $key = $value)*
        )
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($what:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        $(let _ = $value;)*
    }};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_skip {
    ($why:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        $(let _ = $value;)*
    }};
}

pub(crate) use trace_event;
pub(crate) use trace_skip;
pub(crate) use trace_span;

/// Guard returned by `trace_span!` when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
