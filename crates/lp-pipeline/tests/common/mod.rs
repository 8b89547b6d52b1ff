//! Shared fixtures: an on-disk corpus builder and in-process fakes for the
//! external tools.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lp_core::{Blob, CourseId, DurationProbe, Error, Result, TransformSpec, Transformer};
use lp_pipeline::{BuildSettings, PipelineContext, Scheduler, SourceCorpus};
use lp_store::MemoryStore;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Corpus fixture
// ---------------------------------------------------------------------------

pub struct CorpusFixture {
    dir: TempDir,
    courses: Vec<String>,
}

impl CorpusFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            courses: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Add a course whose tracks are `(file name, contents)` pairs.
    pub fn course(mut self, id: &str, tracks: &[(&str, &str)]) -> Self {
        let course_dir = self.dir.path().join("courses").join(id);
        std::fs::create_dir_all(course_dir.join("tracks")).unwrap();

        let listing: String = tracks.iter().map(|(name, _)| format!("{name}\n")).collect();
        std::fs::write(course_dir.join("list.txt"), listing).unwrap();
        for (name, contents) in tracks {
            std::fs::write(course_dir.join("tracks").join(name), contents).unwrap();
        }

        self.courses.push(id.to_string());
        self.write_corpus_listing();
        self
    }

    /// Add a course with a listing of blank lines only.
    pub fn empty_course(mut self, id: &str) -> Self {
        let course_dir = self.dir.path().join("courses").join(id);
        std::fs::create_dir_all(&course_dir).unwrap();
        std::fs::write(course_dir.join("list.txt"), "\n   \n").unwrap();
        self.courses.push(id.to_string());
        self.write_corpus_listing();
        self
    }

    fn write_corpus_listing(&self) {
        let listing: String = self.courses.iter().map(|c| format!("{c}\n")).collect();
        std::fs::write(self.dir.path().join("list.txt"), listing).unwrap();
    }

    pub fn open(&self) -> SourceCorpus {
        SourceCorpus::open(self.dir.path()).unwrap()
    }
}

pub fn three_track_music() -> CorpusFixture {
    CorpusFixture::new().course(
        "music",
        &[
            ("01-intro.mp3", "intro audio"),
            ("02-scales.mp3", "scales audio"),
            ("03-chords.mp3", "chords audio"),
        ],
    )
}

pub fn course(id: &str) -> CourseId {
    CourseId::new(id)
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Tracks how many fake tool calls are running and the highest value seen.
#[derive(Debug, Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Deterministic transformer: output is the spec name followed by the input.
#[derive(Debug, Default)]
pub struct FakeTransformer {
    remux_calls: AtomicUsize,
    low_quality_calls: AtomicUsize,
    /// Inputs containing this marker fail.
    fail_marker: Option<String>,
    delay: Option<Duration>,
    /// Time each call spends blocking its thread, like CPU-bound work.
    busy: Option<Duration>,
    pub gauge: Arc<Gauge>,
}

impl FakeTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration, gauge: Arc<Gauge>) -> Self {
        self.delay = Some(delay);
        self.gauge = gauge;
        self
    }

    pub fn with_busy_work(mut self, busy: Duration, gauge: Arc<Gauge>) -> Self {
        self.busy = Some(busy);
        self.gauge = gauge;
        self
    }

    pub fn remux_calls(&self) -> usize {
        self.remux_calls.load(Ordering::SeqCst)
    }

    pub fn low_quality_calls(&self) -> usize {
        self.low_quality_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transformer for FakeTransformer {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn transform(&self, input: &Blob, spec: TransformSpec, output_name: &str) -> Result<Blob> {
        match spec {
            TransformSpec::Remux => self.remux_calls.fetch_add(1, Ordering::SeqCst),
            TransformSpec::LowQuality => self.low_quality_calls.fetch_add(1, Ordering::SeqCst),
        };

        self.gauge.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(busy) = self.busy {
            std::thread::sleep(busy);
        }
        self.gauge.exit();

        if let Some(marker) = &self.fail_marker {
            if String::from_utf8_lossy(input.data()).contains(marker.as_str()) {
                return Err(Error::transformation("fake", format!("cannot decode {}", input.name())));
            }
        }

        let mut data = format!("{spec}|").into_bytes();
        data.extend_from_slice(input.data());
        Ok(Blob::new(output_name, data))
    }
}

/// Duration is one second per ten bytes.
#[derive(Debug, Default)]
pub struct FakeProbe {
    calls: AtomicUsize,
    delay: Option<Duration>,
    /// Inputs containing this marker cannot be measured.
    fail_marker: Option<String>,
    gauge: Arc<Gauge>,
}

impl FakeProbe {
    pub fn with_delay(delay: Duration, gauge: Arc<Gauge>) -> Self {
        Self {
            delay: Some(delay),
            gauge,
            ..Self::default()
        }
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn expected(blob: &Blob) -> f64 {
        blob.len() as f64 / 10.0
    }
}

#[async_trait]
impl DurationProbe for FakeProbe {
    fn name(&self) -> &'static str {
        "fake-probe"
    }

    async fn duration(&self, blob: &Blob) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gauge.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.gauge.exit();

        if let Some(marker) = &self.fail_marker {
            if String::from_utf8_lossy(blob.data()).contains(marker.as_str()) {
                return Err(Error::transformation(
                    "fake-probe",
                    format!("no duration in {}", blob.name()),
                ));
            }
        }
        Ok(Self::expected(blob))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub transformer: Arc<FakeTransformer>,
    pub probe: Arc<FakeProbe>,
    pub ctx: PipelineContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(MemoryStore::new()),
            FakeTransformer::new(),
            FakeProbe::default(),
        )
    }

    /// A fresh transformer and probe over an existing store.
    pub fn reusing(store: &Arc<MemoryStore>) -> Self {
        Self::with_parts(store.clone(), FakeTransformer::new(), FakeProbe::default())
    }

    pub fn with_parts(
        store: Arc<MemoryStore>,
        transformer: FakeTransformer,
        probe: FakeProbe,
    ) -> Self {
        let transformer = Arc::new(transformer);
        let probe = Arc::new(probe);
        let ctx = PipelineContext::new(store.clone(), transformer.clone(), probe.clone())
            .with_settings(BuildSettings {
                build_version: 1,
                cas_base_url: "https://cdn.example.com/".into(),
                ..BuildSettings::default()
            });
        Self {
            store,
            transformer,
            probe,
            ctx,
        }
    }

    pub fn with_settings(mut self, settings: BuildSettings) -> Self {
        self.ctx = self.ctx.with_settings(settings);
        self
    }

    pub fn with_concurrency(mut self, capacity: usize) -> Self {
        self.ctx = self.ctx.with_scheduler(Scheduler::new(capacity));
        self
    }
}
