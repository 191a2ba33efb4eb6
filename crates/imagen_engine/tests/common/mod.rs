#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use imagen_engine::{
    BackendError, EngineEvent, GeneratedImage, GenerationRequest, ImageBackend, ProgressSink,
};

/// In-memory backend: returns `number_of_images` fake PNGs per call, fails or
/// panics for selected prompts and tracks how many calls overlap.
pub struct ScriptedBackend {
    failing_prompts: HashSet<String>,
    panicking_prompts: HashSet<String>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    prompts_seen: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            failing_prompts: HashSet::new(),
            panicking_prompts: HashSet::new(),
            delay: Duration::from_millis(0),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            prompts_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, prompt: &str) -> Self {
        self.failing_prompts.insert(prompt.to_string());
        self
    }

    pub fn panicking_on(mut self, prompt: &str) -> Self {
        self.panicking_prompts.insert(prompt.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn prompts_seen(&self) -> Vec<String> {
        self.prompts_seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ImageBackend for ScriptedBackend {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedImage>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts_seen
            .lock()
            .unwrap()
            .push(request.prompt.clone());
        if self.panicking_prompts.contains(&request.prompt) {
            panic!("scripted panic for {:?}", request.prompt);
        }
        let _guard = InFlight::enter(&self.in_flight, &self.max_in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing_prompts.contains(&request.prompt) {
            return Err(BackendError::HttpStatus {
                status: 429,
                body: "quota exceeded".to_string(),
            });
        }
        Ok((1..=request.number_of_images)
            .map(|n| GeneratedImage::new(format!("png-{}-{n}", request.prompt).into_bytes(), "image/png"))
            .collect())
    }
}

/// Counts one overlapping call; released on drop so cancelled calls are not leaked.
struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn prompts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn png_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.ends_with(".png"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
