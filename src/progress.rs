//! Extraction progress reporting.
//!
//! OCR extraction is the one long-running operation in this crate, so it
//! reports observable progress for UI progress bars. Progress is emitted on
//! **stderr** so stdout remains parseable for scripts. The percentage is
//! guaranteed monotone: it never decreases and always reaches 100 on
//! success (enforced by [`MonotonicSink`], which the extractor wraps around
//! whatever sink the caller supplies).

use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

/// Stage of the extraction pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractPhase {
    /// Resolving the image reference to raw bytes.
    Resolving,
    /// Decoding and validating the raster image.
    Decoding,
    /// Running the OCR engine over the decoded image.
    Recognizing,
    /// Ordering blocks, computing confidences, assembling the result.
    Assembling,
    /// Extraction finished; percent is 100.
    Done,
}

impl ExtractPhase {
    fn label(&self) -> &'static str {
        match self {
            ExtractPhase::Resolving => "resolving",
            ExtractPhase::Decoding => "decoding",
            ExtractPhase::Recognizing => "recognizing",
            ExtractPhase::Assembling => "assembling",
            ExtractPhase::Done => "done",
        }
    }
}

/// A single progress event for one extraction.
#[derive(Clone, Copy, Debug)]
pub struct ProgressEvent {
    pub phase: ExtractPhase,
    /// Completion percentage, 0-100.
    pub percent: u8,
}

/// Reports extraction progress. Implementations write to stderr (human or
/// JSON) or forward into the caller's UI plumbing.
pub trait ProgressSink: Send + Sync {
    /// Emit a progress event. Called from the extraction pipeline.
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "ocr scan-042  recognizing  60%".
pub struct StderrProgress {
    image_id: String,
}

impl StderrProgress {
    pub fn new(image_id: impl Into<String>) -> Self {
        StderrProgress {
            image_id: image_id.into(),
        }
    }
}

impl ProgressSink for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = format!(
            "ocr {}  {}  {}%\n",
            self.image_id,
            event.phase.label(),
            event.percent
        );
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressSink for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = serde_json::json!({
            "event": "progress",
            "phase": event.phase,
            "percent": event.percent,
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op sink when progress is disabled.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Wraps another sink and clamps the percentage so it never decreases,
/// whatever the stage arithmetic upstream does.
pub struct MonotonicSink<'a> {
    inner: &'a dyn ProgressSink,
    high_water: AtomicU8,
}

impl<'a> MonotonicSink<'a> {
    pub fn new(inner: &'a dyn ProgressSink) -> Self {
        MonotonicSink {
            inner,
            high_water: AtomicU8::new(0),
        }
    }
}

impl ProgressSink for MonotonicSink<'_> {
    fn report(&self, event: ProgressEvent) {
        let clamped = self.high_water.fetch_max(event.percent, Ordering::Relaxed);
        let percent = clamped.max(event.percent).min(100);
        self.inner.report(ProgressEvent {
            phase: event.phase,
            percent,
        });
    }
}

/// Progress mode for callers: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a sink for this mode. Caller passes it to the extractor.
    pub fn sink(&self, image_id: &str) -> Box<dyn ProgressSink> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress::new(image_id)),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Test sink that records every reported percentage.
    pub(crate) struct RecordingSink {
        pub events: Mutex<Vec<(ExtractPhase, u8)>>,
    }

    impl RecordingSink {
        pub(crate) fn new() -> Self {
            RecordingSink {
                events: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProgressSink for RecordingSink {
        fn report(&self, event: ProgressEvent) {
            self.events
                .lock()
                .unwrap()
                .push((event.phase, event.percent));
        }
    }

    #[test]
    fn monotonic_sink_never_regresses() {
        let recorder = RecordingSink::new();
        let sink = MonotonicSink::new(&recorder);
        for (phase, pct) in [
            (ExtractPhase::Resolving, 10),
            (ExtractPhase::Decoding, 35),
            (ExtractPhase::Recognizing, 20), // out-of-order report
            (ExtractPhase::Assembling, 90),
            (ExtractPhase::Done, 100),
        ] {
            sink.report(ProgressEvent { phase, percent: pct });
        }
        let events = recorder.events.lock().unwrap();
        let percents: Vec<u8> = events.iter().map(|(_, p)| *p).collect();
        assert_eq!(percents, vec![10, 35, 35, 90, 100]);
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn monotonic_sink_caps_at_100() {
        let recorder = RecordingSink::new();
        let sink = MonotonicSink::new(&recorder);
        sink.report(ProgressEvent {
            phase: ExtractPhase::Done,
            percent: 150,
        });
        let events = recorder.events.lock().unwrap();
        assert_eq!(events[0].1, 100);
    }

    #[test]
    fn mode_builds_a_sink() {
        // Just exercise construction for each mode.
        for mode in [ProgressMode::Off, ProgressMode::Human, ProgressMode::Json] {
            let sink = mode.sink("scan-001");
            sink.report(ProgressEvent {
                phase: ExtractPhase::Resolving,
                percent: 0,
            });
        }
    }
}
