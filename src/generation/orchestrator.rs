// Batch orchestrator - drives the slot state machine through sequential dispatch

use super::backend::{GenerationBackend, GenerationRequest};
use super::prompt;
use super::types::{BatchRequest, OrchestratorConfig, SlotState, StickerSession};
use crate::error::{Result, StickerError};
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;

/// Runs batches and single-slot regenerations against a session.
///
/// Requests go out strictly one at a time with a flat pacing delay between
/// slots. A slot failure never aborts the batch. Retry of retryable failures
/// happens here, bounded by the configured attempt ceiling; the backend
/// itself never retries.
pub struct StickerOrchestrator {
    config: OrchestratorConfig,
    backend: Arc<dyn GenerationBackend>,
}

impl StickerOrchestrator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self::with_config(backend, OrchestratorConfig::default())
    }

    pub fn with_config(backend: Arc<dyn GenerationBackend>, config: OrchestratorConfig) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one full batch.
    ///
    /// All 8 slots are reset, one base seed is drawn for the batch, and slot
    /// `i` is dispatched with seed `base + i` so the batch leans toward one
    /// recognizable character while each mood still renders distinctly.
    /// Slots beyond the requested quantity stay Empty. A malformed request is
    /// rejected before any slot is touched.
    pub async fn run_batch(
        &self,
        session: &mut StickerSession,
        request: &BatchRequest,
    ) -> Result<()> {
        request.validate()?;

        session.reset();

        let base_seed = draw_seed();
        tracing::info!(
            base_seed,
            quantity = request.quantity,
            backend = self.backend.name(),
            "starting batch"
        );

        for i in 0..request.quantity {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.pacing_ms)).await;
            }

            let mood = request.moods.get(i).cloned().unwrap_or_default();
            let prompt = prompt::compose(&request.character, &mood, &request.detail, &request.style);
            let seed = base_seed + i as u64;

            session.slots_mut()[i].begin(mood, prompt.clone(), seed);

            match self.dispatch(&prompt, seed).await {
                Ok(image) => {
                    tracing::info!(slot = i, "slot ready");
                    session.slots_mut()[i].complete(image);
                }
                Err(e) => {
                    tracing::warn!(slot = i, error = %e, "slot failed");
                    session.slots_mut()[i].fail(e.to_string());
                }
            }
        }

        Ok(())
    }

    /// Redo a single finished slot with a fresh, independent seed.
    ///
    /// The slot's stored prompt is reused unchanged. On success the new seed
    /// and image replace the old ones; on failure the slot keeps whatever it
    /// had, and the dispatch error is returned. Other slots are never touched.
    pub async fn regenerate(&self, session: &mut StickerSession, index: usize) -> Result<()> {
        let slot = session.slot(index).ok_or_else(|| {
            StickerError::InvalidRequest(format!("slot index {index} out of range"))
        })?;
        if !matches!(slot.state, SlotState::Ready | SlotState::Failed) {
            return Err(StickerError::InvalidRequest(format!(
                "slot {index} has no generation to redo"
            )));
        }

        let prompt = slot.prompt.clone();
        let seed = draw_seed();
        tracing::info!(slot = index, seed, "regenerating slot");

        match self.dispatch(&prompt, seed).await {
            Ok(image) => {
                let slot = &mut session.slots_mut()[index];
                slot.seed = seed;
                slot.complete(image);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(slot = index, error = %e, "regeneration failed; keeping previous result");
                Err(e)
            }
        }
    }

    /// One slot dispatch: bounded attempt loop around the backend call,
    /// then decode. Warming-up and network failures wait and retry; a decode
    /// failure or hard backend failure ends the dispatch immediately.
    async fn dispatch(&self, prompt: &str, seed: u64) -> Result<RgbaImage> {
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            seed,
            width: self.config.request_width,
            height: self.config.request_height,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.backend.generate(&request).await {
                Ok(bytes) => {
                    let image = image::load_from_memory(&bytes)
                        .map_err(|e| StickerError::Decode(e.to_string()))?;
                    return Ok(image.to_rgba8());
                }
                Err(e @ StickerError::ServiceUnavailable(_))
                    if attempt < self.config.max_attempts =>
                {
                    tracing::warn!(attempt, error = %e, "service warming up; waiting");
                    tokio::time::sleep(Duration::from_millis(self.config.warmup_delay_ms)).await;
                }
                Err(e @ StickerError::Network(_)) if attempt < self.config.max_attempts => {
                    tracing::warn!(attempt, error = %e, "network error; retrying");
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Fresh random seed. Drawn in u32 range so per-slot offsets never wrap.
fn draw_seed() -> u64 {
    rand::random::<u32>() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::types::SLOT_COUNT;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::Mutex;

    enum Reply {
        Image,
        Garbage,
        Unavailable,
        NetworkDown,
        HardFail,
    }

    /// Scripted backend: pops one reply per call, succeeding once the
    /// script runs out, and records every request it sees.
    struct ScriptedBackend {
        script: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>> {
            self.requests.lock().unwrap().push(request.clone());
            match self.script.lock().unwrap().pop_front() {
                None | Some(Reply::Image) => Ok(png_bytes()),
                Some(Reply::Garbage) => Ok(b"not an image".to_vec()),
                Some(Reply::Unavailable) => Err(StickerError::ServiceUnavailable(
                    "warming up".to_string(),
                )),
                Some(Reply::NetworkDown) => {
                    Err(StickerError::Network("connection refused".to_string()))
                }
                Some(Reply::HardFail) => {
                    Err(StickerError::Generation("status 400".to_string()))
                }
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn png_bytes() -> Vec<u8> {
        let image = RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn test_config() -> OrchestratorConfig {
        OrchestratorConfig {
            pacing_ms: 0,
            retry_delay_ms: 0,
            warmup_delay_ms: 0,
            ..OrchestratorConfig::default()
        }
    }

    fn build_orchestrator(backend: Arc<ScriptedBackend>) -> StickerOrchestrator {
        StickerOrchestrator::with_config(backend, test_config())
    }

    #[tokio::test]
    async fn test_successful_batch_fills_exactly_quantity_slots() {
        for quantity in 1..=SLOT_COUNT {
            let backend = ScriptedBackend::new(vec![]);
            let orchestrator = build_orchestrator(backend.clone());
            let mut session = StickerSession::new();
            let request = BatchRequest::new("a shiba inu").with_quantity(quantity);

            orchestrator.run_batch(&mut session, &request).await.unwrap();

            assert_eq!(session.ready_count(), quantity);
            for slot in &session.slots()[quantity..] {
                assert_eq!(slot.state, SlotState::Empty);
            }
            assert_eq!(backend.calls(), quantity);
        }
    }

    #[tokio::test]
    async fn test_slot_seeds_follow_base_seed_lineage() {
        let backend = ScriptedBackend::new(vec![]);
        let orchestrator = build_orchestrator(backend.clone());
        let mut session = StickerSession::new();
        let request = BatchRequest::new("a fox").with_quantity(8);

        orchestrator.run_batch(&mut session, &request).await.unwrap();

        let base = session.slots()[0].seed;
        for (i, slot) in session.slots().iter().enumerate() {
            assert_eq!(slot.seed, base + i as u64);
        }
        for (i, dispatched) in backend.requests().iter().enumerate() {
            assert_eq!(dispatched.seed, base + i as u64);
        }
    }

    #[tokio::test]
    async fn test_excess_moods_reject_before_any_dispatch() {
        let backend = ScriptedBackend::new(vec![]);
        let orchestrator = build_orchestrator(backend.clone());
        let mut session = StickerSession::new();
        let request = BatchRequest::new("a cat")
            .with_moods(vec!["happy".into(), "sad".into(), "angry".into()])
            .with_quantity(2);

        let err = orchestrator
            .run_batch(&mut session, &request)
            .await
            .unwrap_err();

        assert!(matches!(err, StickerError::InvalidRequest(_)));
        assert_eq!(backend.calls(), 0);
        assert!(session
            .slots()
            .iter()
            .all(|s| s.state == SlotState::Empty));
    }

    #[tokio::test]
    async fn test_missing_moods_become_empty_labels() {
        let backend = ScriptedBackend::new(vec![]);
        let orchestrator = build_orchestrator(backend.clone());
        let mut session = StickerSession::new();
        let request = BatchRequest::new("a cat")
            .with_moods(vec!["happy".into()])
            .with_quantity(3);

        orchestrator.run_batch(&mut session, &request).await.unwrap();

        assert_eq!(session.slots()[0].mood, "happy");
        assert_eq!(session.slots()[1].mood, "");
        assert_eq!(session.slots()[2].mood, "");
        assert!(!session.slots()[1].prompt.is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_never_aborts_the_batch() {
        let backend =
            ScriptedBackend::new(vec![Reply::Image, Reply::Image, Reply::HardFail, Reply::Image]);
        let orchestrator = build_orchestrator(backend.clone());
        let mut session = StickerSession::new();
        let request = BatchRequest::new("a cat").with_quantity(4);

        orchestrator.run_batch(&mut session, &request).await.unwrap();

        assert_eq!(session.slots()[2].state, SlotState::Failed);
        assert!(session.slots()[2].error.is_some());
        assert_eq!(session.slots()[3].state, SlotState::Ready);
        assert_eq!(session.ready_count(), 3);
        assert_eq!(backend.calls(), 4);
    }

    #[tokio::test]
    async fn test_retryable_failures_are_retried_up_to_ceiling() {
        // Recovers within the ceiling
        let backend = ScriptedBackend::new(vec![Reply::NetworkDown, Reply::Image]);
        let orchestrator = build_orchestrator(backend.clone());
        let mut session = StickerSession::new();
        let request = BatchRequest::new("a cat").with_quantity(1);
        orchestrator.run_batch(&mut session, &request).await.unwrap();
        assert_eq!(session.slots()[0].state, SlotState::Ready);
        assert_eq!(backend.calls(), 2);

        // Exhausts the ceiling
        let backend = ScriptedBackend::new(vec![
            Reply::Unavailable,
            Reply::Unavailable,
            Reply::Unavailable,
        ]);
        let orchestrator = build_orchestrator(backend.clone());
        let mut session = StickerSession::new();
        orchestrator.run_batch(&mut session, &request).await.unwrap();
        assert_eq!(session.slots()[0].state, SlotState::Failed);
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_undecodable_response_fails_without_retry() {
        let backend = ScriptedBackend::new(vec![Reply::Garbage]);
        let orchestrator = build_orchestrator(backend.clone());
        let mut session = StickerSession::new();
        let request = BatchRequest::new("a cat").with_quantity(1);

        orchestrator.run_batch(&mut session, &request).await.unwrap();

        assert_eq!(session.slots()[0].state, SlotState::Failed);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_regenerate_touches_only_the_target_slot() {
        let backend = ScriptedBackend::new(vec![Reply::Image, Reply::HardFail, Reply::Image]);
        let orchestrator = build_orchestrator(backend.clone());
        let mut session = StickerSession::new();
        let request = BatchRequest::new("a cat").with_quantity(3);
        orchestrator.run_batch(&mut session, &request).await.unwrap();
        assert_eq!(session.slots()[1].state, SlotState::Failed);

        let before: Vec<_> = session.slots().to_vec();
        orchestrator.regenerate(&mut session, 1).await.unwrap();

        assert_eq!(session.slots()[1].state, SlotState::Ready);
        assert!(session.slots()[1].image.is_some());
        assert_eq!(session.slots()[0], before[0]);
        assert_eq!(session.slots()[2], before[2]);

        // The stored prompt was reused and a fresh seed dispatched
        let dispatched = backend.requests();
        assert_eq!(dispatched.len(), 4);
        assert_eq!(dispatched[3].prompt, session.slots()[1].prompt);
        assert_eq!(dispatched[3].seed, session.slots()[1].seed);
    }

    #[tokio::test]
    async fn test_failed_regenerate_keeps_the_previous_image() {
        let backend = ScriptedBackend::new(vec![Reply::Image, Reply::HardFail]);
        let orchestrator = build_orchestrator(backend.clone());
        let mut session = StickerSession::new();
        let request = BatchRequest::new("a cat").with_quantity(1);
        orchestrator.run_batch(&mut session, &request).await.unwrap();

        let before = session.slots()[0].clone();
        let err = orchestrator.regenerate(&mut session, 0).await.unwrap_err();

        assert!(matches!(err, StickerError::Generation(_)));
        assert_eq!(session.slots()[0], before);
    }

    #[tokio::test]
    async fn test_regenerate_rejects_empty_slots() {
        let backend = ScriptedBackend::new(vec![]);
        let orchestrator = build_orchestrator(backend.clone());
        let mut session = StickerSession::new();

        let err = orchestrator.regenerate(&mut session, 5).await.unwrap_err();
        assert!(matches!(err, StickerError::InvalidRequest(_)));
        assert_eq!(backend.calls(), 0);
    }
}
