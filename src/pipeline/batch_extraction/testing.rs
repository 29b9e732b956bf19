//! Deterministic Extractor double shared by the pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::error::ExtractorError;
use super::traits::Extractor;
use super::types::{ExtractionRequest, FieldKind, FieldValues};
use crate::models::Stage;

type Responder =
    Box<dyn Fn(&ExtractionRequest<'_>) -> Result<FieldValues, ExtractorError> + Send + Sync>;

/// What the double saw for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub organ: String,
    pub abnormality: Option<String>,
    pub stage: Stage,
    pub scope: Option<String>,
    pub text: String,
    pub fields: Vec<String>,
}

/// Extractor answering from a closure and recording every request.
pub struct ScriptedExtractor {
    responder: Responder,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Option<Duration>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ExtractionRequest<'_>) -> Result<FieldValues, ExtractorError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            latency: None,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Hold every call open for `latency` so overlapping calls show up in
    /// `peak_concurrency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Most calls that were open at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Answers every question with 0.
    pub fn negative() -> Self {
        Self::new(|req| Ok(answer(req, &[])))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, stage: Stage) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.stage == stage).collect()
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, request: &ExtractionRequest<'_>) -> Result<FieldValues, ExtractorError> {
        self.calls.lock().unwrap().push(RecordedCall {
            organ: request.organ.to_string(),
            abnormality: request.abnormality.map(|d| d.name.to_string()),
            stage: request.stage,
            scope: request.scope.map(str::to_string),
            text: request.text.to_string(),
            fields: request.fields.iter().map(|f| f.name.clone()).collect(),
        });
        let open = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(open, Ordering::SeqCst);
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            // Yield so concurrent callers interleave like real I/O.
            None => tokio::task::yield_now().await,
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        (self.responder)(request)
    }
}

/// Fill every declared field: listed flags are 1, other flags 0, text
/// fields echo the request text.
pub fn answer(request: &ExtractionRequest<'_>, positive: &[&str]) -> FieldValues {
    let mut values = FieldValues::new();
    for field in request.fields {
        values = match field.kind {
            FieldKind::Flag => values.with_flag(&field.name, positive.contains(&field.name.as_str())),
            FieldKind::Text => values.with_text(&field.name, request.text),
        };
    }
    values
}

/// Whether the request concerns the named abnormality.
pub fn is_about(request: &ExtractionRequest<'_>, abnormality: &str) -> bool {
    request.abnormality.map(|d| d.name) == Some(abnormality)
}
