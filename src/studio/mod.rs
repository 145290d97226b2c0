pub mod eligibility;
pub mod image;
pub mod request;
pub mod scene;

use std::str::FromStr;

use futures_util::future::try_join_all;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::catalog::{find_background, find_pose};
use crate::error::{ApiStatus, Operation, StudioError};
use crate::llm::provider::TryOnProvider;
use eligibility::{can_generate, generation_blocker, GenerationBlocker, InFlight};
use image::ImageData;
use request::build_generation_requests;
use scene::{BackgroundMode, GarmentCategory, PoseMode, ProductStatus, SceneConfig, VariationCount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadTarget {
    #[default]
    Face,
    Product,
    Pose,
    Background,
}

impl FromStr for UploadTarget {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "face" => Ok(UploadTarget::Face),
            "product" | "garment" => Ok(UploadTarget::Product),
            "pose" => Ok(UploadTarget::Pose),
            "background" => Ok(UploadTarget::Background),
            other => Err(format!("Unknown upload target '{other}'")),
        }
    }
}

#[derive(Debug, Default)]
struct StudioState {
    scene: SceneConfig,
    in_flight: InFlight,
    error: Option<String>,
    generated: Option<Vec<String>>,
    upload_target: UploadTarget,
    pose_text_seq: u64,
    background_text_seq: u64,
}

impl StudioState {
    fn text_seq(&mut self, target: SceneText) -> &mut u64 {
        match target {
            SceneText::Pose => &mut self.pose_text_seq,
            SceneText::Background => &mut self.background_text_seq,
        }
    }

    fn supersede_text(&mut self, target: SceneText) -> TextTicket {
        let seq = self.text_seq(target);
        *seq += 1;
        TextTicket { target, seq: *seq }
    }

    fn begin_text(&mut self, flag: Flag, target: SceneText) -> TextTicket {
        *flag.slot(&mut self.in_flight) += 1;
        self.error = None;
        self.supersede_text(target)
    }

    fn finish_text(&mut self, flag: Flag, ticket: TextTicket) -> bool {
        let count = flag.slot(&mut self.in_flight);
        *count = count.saturating_sub(1);
        *self.text_seq(ticket.target) == ticket.seq
    }
}

#[derive(Debug, Clone, Copy)]
enum Flag {
    InspiringPose,
    InspiringBackground,
    DescribingPose,
    DescribingBackground,
}

impl Flag {
    fn slot(self, in_flight: &mut InFlight) -> &mut u32 {
        match self {
            Flag::InspiringPose => &mut in_flight.inspiring_pose,
            Flag::InspiringBackground => &mut in_flight.inspiring_background,
            Flag::DescribingPose => &mut in_flight.describing_pose,
            Flag::DescribingBackground => &mut in_flight.describing_background,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SceneText {
    Pose,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TextTicket {
    target: SceneText,
    seq: u64,
}

/// Drives one try-on session against a provider.
///
/// Async operations lock only around state changes, never across a provider
/// call, and write back to the slot chosen when they were started. Several
/// operations may therefore run at once on a shared `&Studio`.
pub struct Studio<P> {
    provider: P,
    state: Mutex<StudioState>,
}

impl<P: TryOnProvider> Studio<P> {
    pub fn new(provider: P) -> Self {
        Studio {
            provider,
            state: Mutex::new(StudioState::default()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn with_scene<R>(&self, read: impl FnOnce(&SceneConfig) -> R) -> R {
        read(&self.state.lock().scene)
    }

    pub fn in_flight(&self) -> InFlight {
        self.state.lock().in_flight
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn dismiss_error(&self) {
        self.state.lock().error = None;
    }

    pub fn generated(&self) -> Option<Vec<String>> {
        self.state.lock().generated.clone()
    }

    pub fn generation_blocker(&self) -> Option<GenerationBlocker> {
        let state = self.state.lock();
        generation_blocker(&state.scene, &state.in_flight)
    }

    pub fn can_generate(&self) -> bool {
        let state = self.state.lock();
        can_generate(&state.scene, &state.in_flight)
    }

    fn surface(&self, err: StudioError) -> StudioError {
        self.state.lock().error = Some(err.to_string());
        err
    }

    pub fn set_face(&self, image: ImageData) {
        self.state.lock().scene.set_face(image);
    }

    pub fn switch_category(&self, category: GarmentCategory) {
        let mut state = self.state.lock();
        if state.scene.switch_category(category) {
            state.error = None;
        }
    }

    pub fn approve_product(&self, category: GarmentCategory) -> Result<(), StudioError> {
        self.state
            .lock()
            .scene
            .approve(category)
            .map_err(|err| StudioError::validation(err.to_string()))
    }

    pub fn reject_product(&self, category: GarmentCategory) -> Result<(), StudioError> {
        self.state
            .lock()
            .scene
            .reject(category)
            .map_err(|err| StudioError::validation(err.to_string()))
    }

    pub fn set_pose_mode(&self, mode: PoseMode) -> PoseMode {
        self.state.lock().scene.set_pose_mode(mode)
    }

    pub fn select_pose(&self, id: u32) -> Result<(), StudioError> {
        let pose = find_pose(id)
            .ok_or_else(|| StudioError::validation(format!("Unknown pose id {id}")))?;
        self.state.lock().scene.select_pose(pose);
        Ok(())
    }

    pub fn set_described_pose(&self, text: impl Into<String>) {
        let mut state = self.state.lock();
        state.supersede_text(SceneText::Pose);
        state.scene.set_described_pose(text);
    }

    pub fn set_background_mode(&self, mode: BackgroundMode) {
        self.state.lock().scene.set_background_mode(mode);
    }

    pub fn select_background(&self, id: u32) -> Result<(), StudioError> {
        let option = find_background(id)
            .ok_or_else(|| StudioError::validation(format!("Unknown background id {id}")))?;
        self.state.lock().scene.select_background(option);
        Ok(())
    }

    pub fn set_described_background(&self, text: impl Into<String>) {
        let mut state = self.state.lock();
        state.supersede_text(SceneText::Background);
        state.scene.set_described_background(text);
    }

    pub fn set_variations(&self, count: u8) -> VariationCount {
        self.state.lock().scene.set_variations(count)
    }

    pub fn increment_variations(&self) -> VariationCount {
        self.state.lock().scene.increment_variations()
    }

    pub fn decrement_variations(&self) -> VariationCount {
        self.state.lock().scene.decrement_variations()
    }

    pub fn upload_target(&self) -> UploadTarget {
        self.state.lock().upload_target
    }

    pub fn set_upload_target(&self, target: UploadTarget) {
        self.state.lock().upload_target = target;
    }

    pub async fn ingest(&self, image: ImageData) -> Result<(), StudioError> {
        let (target, category) = {
            let state = self.state.lock();
            (state.upload_target, state.scene.category())
        };
        debug!("Routing uploaded {} to {:?}", image.mime_type, target);
        match target {
            UploadTarget::Face => {
                self.set_face(image);
                Ok(())
            }
            UploadTarget::Product => self.upload_product(category, image).await,
            UploadTarget::Pose => self.describe_pose_from_upload(image).await,
            UploadTarget::Background => self.describe_background_from_upload(image).await,
        }
    }

    pub async fn upload_product(
        &self,
        category: GarmentCategory,
        image: ImageData,
    ) -> Result<(), StudioError> {
        let ticket = {
            let mut state = self.state.lock();
            state.error = None;
            state.scene.begin_render(category, image.clone())
        };
        info!(category = %category, "Rendering garment for try-on");

        let result = self.provider.isolate_garment(&image).await;

        let mut state = self.state.lock();
        match result {
            Ok(rendered) => {
                if !state.scene.complete_render(ticket, ImageData::png(rendered)) {
                    debug!(category = %category, "Discarding superseded garment render");
                }
                Ok(())
            }
            Err(err) => {
                error!(category = %category, "Garment render failed: {}", err);
                let studio_err = StudioError::classify(&err, Operation::RenderProduct);
                if state.scene.fail_render(ticket) {
                    state.error = Some(studio_err.to_string());
                }
                Err(studio_err)
            }
        }
    }

    pub async fn describe_pose_from_upload(&self, image: ImageData) -> Result<(), StudioError> {
        let ticket = {
            let mut state = self.state.lock();
            state.scene.set_uploaded_pose(image.clone());
            state.begin_text(Flag::DescribingPose, SceneText::Pose)
        };
        self.run_text_operation(
            ticket,
            Flag::DescribingPose,
            Operation::DescribePoseFromImage,
            self.provider.describe_pose(&image),
        )
        .await
    }

    pub async fn describe_background_from_upload(
        &self,
        image: ImageData,
    ) -> Result<(), StudioError> {
        let ticket = {
            let mut state = self.state.lock();
            state.scene.set_uploaded_background(image.clone());
            state.begin_text(Flag::DescribingBackground, SceneText::Background)
        };
        self.run_text_operation(
            ticket,
            Flag::DescribingBackground,
            Operation::DescribeBackgroundFromImage,
            self.provider.describe_background(&image),
        )
        .await
    }

    pub async fn inspire_pose(&self) -> Result<(), StudioError> {
        let garment = self.approved_garment()?;
        let ticket = self
            .state
            .lock()
            .begin_text(Flag::InspiringPose, SceneText::Pose);
        self.run_text_operation(
            ticket,
            Flag::InspiringPose,
            Operation::GenerateCreativePose,
            self.provider.suggest_pose(&garment),
        )
        .await
    }

    pub async fn inspire_background(&self) -> Result<(), StudioError> {
        let garment = self.approved_garment()?;
        let ticket = self
            .state
            .lock()
            .begin_text(Flag::InspiringBackground, SceneText::Background);
        self.run_text_operation(
            ticket,
            Flag::InspiringBackground,
            Operation::GenerateCreativeBackground,
            self.provider.suggest_background(&garment),
        )
        .await
    }

    fn approved_garment(&self) -> Result<ImageData, StudioError> {
        let garment = self
            .state
            .lock()
            .scene
            .active_product()
            .approved_garment()
            .cloned();
        garment.ok_or_else(|| {
            self.surface(StudioError::validation(
                "Please approve a product image first to get inspired.",
            ))
        })
    }

    /// Completes a text call started with `ticket`. A superseded result or
    /// failure is dropped; otherwise the text is stored and the matching mode
    /// switches to describe.
    async fn run_text_operation(
        &self,
        ticket: TextTicket,
        flag: Flag,
        operation: Operation,
        call: impl std::future::Future<Output = Result<String, crate::error::ProviderError>>,
    ) -> Result<(), StudioError> {
        let result = call.await;

        let mut state = self.state.lock();
        let current = state.finish_text(flag, ticket);
        match result {
            Ok(text) => {
                if !current {
                    debug!(operation = operation.as_str(), "Discarding superseded text result");
                    return Ok(());
                }
                match ticket.target {
                    SceneText::Pose => {
                        state.scene.set_described_pose(text);
                        state.scene.set_pose_mode(PoseMode::Describe);
                    }
                    SceneText::Background => {
                        state.scene.set_described_background(text);
                        state.scene.set_background_mode(BackgroundMode::Describe);
                    }
                }
                Ok(())
            }
            Err(err) => {
                error!(operation = operation.as_str(), "Provider call failed: {}", err);
                let studio_err = StudioError::classify(&err, operation);
                if current {
                    state.error = Some(studio_err.to_string());
                }
                Err(studio_err)
            }
        }
    }

    /// Issues one request per variation concurrently. Any failure fails the
    /// whole batch and no partial results are kept.
    pub async fn generate(&self) -> Result<Vec<String>, StudioError> {
        let requests = {
            let mut state = self.state.lock();
            if let Some(blocker) = generation_blocker(&state.scene, &state.in_flight) {
                return Err(StudioError::validation(blocker.to_string()));
            }
            let requests = match build_generation_requests(&state.scene) {
                Ok(requests) => requests,
                Err(err) => {
                    state.error = Some(err.to_string());
                    return Err(err);
                }
            };
            state.in_flight.generating += 1;
            state.error = None;
            state.generated = None;
            requests
        };

        let category = requests[0].category;
        info!(
            category = %category,
            variations = requests.len(),
            provider = self.provider.name(),
            "Generating try-on images"
        );

        let result = try_join_all(
            requests
                .iter()
                .map(|request| self.provider.synthesize(request)),
        )
        .await;

        let mut state = self.state.lock();
        state.in_flight.generating = state.in_flight.generating.saturating_sub(1);
        match result {
            Ok(payloads) => {
                let images: Vec<String> = payloads
                    .into_iter()
                    .map(|payload| ImageData::png(payload).to_data_uri())
                    .collect();
                state.generated = Some(images.clone());
                Ok(images)
            }
            Err(err) => {
                error!(category = %category, "Try-on generation failed: {}", err);
                let studio_err = StudioError::classify(&err, Operation::GenerateTryOn);
                state.error = Some(studio_err.to_string());
                Err(studio_err)
            }
        }
    }

    pub async fn check_status(&self) -> ApiStatus {
        let status = ApiStatus::from_ping(self.provider.ping().await);
        if status.is_operational() {
            info!("{}", status.message());
        } else {
            warn!("{}", status.message());
        }
        status
    }

    pub fn product_status(&self, category: GarmentCategory) -> ProductStatus {
        self.with_scene(|scene| scene.product(category).status())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Notify;

    use super::*;
    use crate::catalog::find_pose;
    use crate::error::{ProviderError, RATE_LIMIT_MESSAGE};
    use crate::llm::provider::SynthesisRequest;

    #[derive(Default)]
    struct ScriptedProvider {
        fail_variation: Option<u8>,
        synth_error: Option<String>,
        isolation_error: Option<String>,
        describe_error: Option<String>,
        render_gate: Option<Arc<Notify>>,
        text_gate: Option<Arc<Notify>>,
        synth_calls: Mutex<Vec<SynthesisRequest>>,
    }

    impl TryOnProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn synthesize(&self, request: &SynthesisRequest) -> Result<String, ProviderError> {
            self.synth_calls.lock().push(request.clone());
            if self.fail_variation == Some(request.variation.index) {
                let message = self
                    .synth_error
                    .clone()
                    .unwrap_or_else(|| "upstream exploded".to_string());
                return Err(ProviderError::new(message));
            }
            Ok(format!("IMG{}", request.variation.index))
        }

        async fn isolate_garment(&self, garment: &ImageData) -> Result<String, ProviderError> {
            if let Some(gate) = &self.render_gate {
                gate.notified().await;
            }
            match &self.isolation_error {
                Some(message) => Err(ProviderError::new(message.clone())),
                None => Ok(format!("isolated-{}", garment.base64)),
            }
        }

        async fn describe_pose(&self, image: &ImageData) -> Result<String, ProviderError> {
            if image.base64.starts_with("slow") {
                if let Some(gate) = &self.text_gate {
                    gate.notified().await;
                }
            }
            match &self.describe_error {
                Some(message) => Err(ProviderError::new(message.clone())),
                None => Ok(format!("pose seen in {}", image.base64)),
            }
        }

        async fn describe_background(&self, _image: &ImageData) -> Result<String, ProviderError> {
            Ok("rainy rooftop at dusk".to_string())
        }

        async fn suggest_pose(&self, garment: &ImageData) -> Result<String, ProviderError> {
            if let Some(gate) = &self.text_gate {
                gate.notified().await;
            }
            Ok(format!("pose for {}", garment.base64))
        }

        async fn suggest_background(&self, garment: &ImageData) -> Result<String, ProviderError> {
            Ok(format!("scene for {}", garment.base64))
        }

        async fn ping(&self) -> Result<(), ProviderError> {
            Err(ProviderError::new("429 Too Many Requests"))
        }
    }

    fn image(tag: &str) -> ImageData {
        ImageData::new(tag, "image/jpeg")
    }

    async fn approved_studio(provider: ScriptedProvider) -> Studio<ScriptedProvider> {
        let studio = Studio::new(provider);
        studio.set_face(image("face"));
        studio
            .upload_product(GarmentCategory::Upper, image("shirt"))
            .await
            .expect("render");
        studio
            .approve_product(GarmentCategory::Upper)
            .expect("approve");
        studio
    }

    #[tokio::test]
    async fn upload_renders_then_waits_for_approval() {
        let studio = Studio::new(ScriptedProvider::default());
        studio
            .upload_product(GarmentCategory::Upper, image("shirt"))
            .await
            .expect("render");
        assert_eq!(
            studio.product_status(GarmentCategory::Upper),
            ProductStatus::PendingApproval
        );
        let rendered = studio.with_scene(|scene| scene.active_product().rendered().cloned());
        assert_eq!(rendered, Some(ImageData::png("isolated-shirt")));

        studio
            .approve_product(GarmentCategory::Upper)
            .expect("approve");
        assert!(studio.approve_product(GarmentCategory::Upper).is_err());
        assert_eq!(
            studio.product_status(GarmentCategory::Upper),
            ProductStatus::Approved
        );
    }

    #[tokio::test]
    async fn failed_render_resets_only_its_category() {
        let studio = approved_studio(ScriptedProvider::default()).await;
        let studio = Studio {
            provider: ScriptedProvider {
                isolation_error: Some("model returned garbage".to_string()),
                ..ScriptedProvider::default()
            },
            state: studio.state,
        };

        let err = studio
            .upload_product(GarmentCategory::Lower, image("jeans"))
            .await
            .expect_err("render fails");
        assert_eq!(
            err.to_string(),
            "Failed to render product. The image might be unclear or unsupported."
        );
        assert_eq!(studio.error(), Some(err.to_string()));
        studio.with_scene(|scene| {
            let lower = scene.product(GarmentCategory::Lower);
            assert_eq!(lower.status(), ProductStatus::Idle);
            assert!(lower.original().is_none());
            assert!(lower.rendered().is_none());
            assert_eq!(
                scene.product(GarmentCategory::Upper).status(),
                ProductStatus::Approved
            );
        });
    }

    #[tokio::test]
    async fn render_result_lands_in_category_captured_at_call_time() {
        let gate = Arc::new(Notify::new());
        let studio = Studio::new(ScriptedProvider {
            render_gate: Some(gate.clone()),
            ..ScriptedProvider::default()
        });

        let upload = studio.upload_product(GarmentCategory::Upper, image("shirt"));
        let interleave = async {
            studio.switch_category(GarmentCategory::Full);
            assert_eq!(
                studio.product_status(GarmentCategory::Upper),
                ProductStatus::Rendering
            );
            gate.notify_one();
        };
        let (result, ()) = tokio::join!(upload, interleave);
        result.expect("render");

        assert_eq!(
            studio.with_scene(|scene| scene.category()),
            GarmentCategory::Full
        );
        assert_eq!(
            studio.product_status(GarmentCategory::Full),
            ProductStatus::Idle
        );
        assert_eq!(
            studio.product_status(GarmentCategory::Upper),
            ProductStatus::PendingApproval
        );
    }

    #[tokio::test]
    async fn single_selected_pose_issues_one_request_without_background() {
        let studio = approved_studio(ScriptedProvider::default()).await;
        studio.select_pose(3).expect("pose 3");

        let images = studio.generate().await.expect("generate");
        assert_eq!(images, vec!["data:image/png;base64,IMG1".to_string()]);
        assert_eq!(studio.generated(), Some(images));

        let calls = studio.provider().synth_calls.lock().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].background, None);
        assert_eq!(
            calls[0].pose,
            find_pose(3).expect("pose").description
        );
        assert_eq!(calls[0].garment, ImageData::png("isolated-shirt"));
        assert_eq!(studio.in_flight().generating, 0);
    }

    #[tokio::test]
    async fn one_failing_variation_fails_the_batch() {
        let studio = approved_studio(ScriptedProvider {
            fail_variation: Some(2),
            ..ScriptedProvider::default()
        })
        .await;
        studio.set_variations(3);
        studio.set_described_pose("spinning");

        let err = studio.generate().await.expect_err("batch fails");
        assert_eq!(err.to_string(), "Failed to generate image. Please try again.");
        assert_eq!(studio.generated(), None);
        assert_eq!(studio.error(), Some(err.to_string()));
        assert_eq!(studio.in_flight().generating, 0);

        let indexes: Vec<u8> = studio
            .provider()
            .synth_calls
            .lock()
            .iter()
            .map(|call| call.variation.index)
            .collect();
        assert!(indexes.contains(&2));
        assert!(indexes.iter().all(|index| (1..=3).contains(index)));
    }

    #[tokio::test]
    async fn all_variations_succeed_in_request_order() {
        let studio = approved_studio(ScriptedProvider::default()).await;
        studio.set_variations(3);
        studio.set_described_pose("spinning");
        let images = studio.generate().await.expect("generate");
        assert_eq!(
            images,
            vec![
                "data:image/png;base64,IMG1".to_string(),
                "data:image/png;base64,IMG2".to_string(),
                "data:image/png;base64,IMG3".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn rate_limit_errors_use_fixed_sentence() {
        let studio = approved_studio(ScriptedProvider {
            fail_variation: Some(1),
            synth_error: Some("status 429: RESOURCE_EXHAUSTED".to_string()),
            ..ScriptedProvider::default()
        })
        .await;
        studio.select_pose(1).expect("pose");
        let err = studio.generate().await.expect_err("rate limited");
        assert_eq!(err, StudioError::RateLimited);
        assert_eq!(studio.error().as_deref(), Some(RATE_LIMIT_MESSAGE));
    }

    #[tokio::test]
    async fn blocked_generation_never_reaches_provider() {
        let studio = Studio::new(ScriptedProvider::default());
        studio.set_described_pose("standing");
        studio.set_pose_mode(PoseMode::Describe);
        let err = studio.generate().await.expect_err("no face");
        assert!(matches!(err, StudioError::Validation(_)));
        assert!(studio.provider().synth_calls.lock().is_empty());
        assert_eq!(studio.generation_blocker(), Some(GenerationBlocker::MissingFace));
    }

    #[tokio::test]
    async fn pose_upload_is_described_and_switches_mode() {
        let studio = Studio::new(ScriptedProvider::default());
        studio
            .describe_pose_from_upload(image("pose-ref"))
            .await
            .expect("describe");
        studio.with_scene(|scene| {
            assert_eq!(scene.pose_mode(), PoseMode::Describe);
            assert_eq!(scene.described_pose(), "pose seen in pose-ref");
            assert_eq!(scene.uploaded_pose(), Some(&image("pose-ref")));
        });
        assert_eq!(studio.in_flight().describing_pose, 0);
    }

    #[tokio::test]
    async fn failed_pose_description_keeps_image_and_mode() {
        let studio = Studio::new(ScriptedProvider {
            describe_error: Some("Response was blocked due to SAFETY".to_string()),
            ..ScriptedProvider::default()
        });
        let err = studio
            .describe_pose_from_upload(image("pose-ref"))
            .await
            .expect_err("blocked");
        assert_eq!(err, StudioError::SafetyBlocked);
        studio.with_scene(|scene| {
            assert_eq!(scene.pose_mode(), PoseMode::Select);
            assert_eq!(scene.uploaded_pose(), Some(&image("pose-ref")));
            assert!(scene.described_pose().is_empty());
        });
        assert!(studio.error().is_some());
        studio.dismiss_error();
        assert!(studio.error().is_none());
    }

    #[tokio::test]
    async fn overlapping_descriptions_keep_latest_upload_and_stay_busy() {
        let gate = Arc::new(Notify::new());
        let studio = Studio::new(ScriptedProvider {
            text_gate: Some(gate.clone()),
            ..ScriptedProvider::default()
        });

        let first = studio.describe_pose_from_upload(image("slow-pose"));
        let second = async {
            studio
                .describe_pose_from_upload(image("quick-pose"))
                .await
                .expect("second describe");
            assert_eq!(studio.in_flight().describing_pose, 1);
            assert_eq!(studio.generation_blocker(), Some(GenerationBlocker::Busy));
            assert!(!studio.can_generate());
            gate.notify_one();
        };
        let (first_result, ()) = tokio::join!(first, second);
        first_result.expect("superseded describe is not an error");

        assert_eq!(studio.in_flight().describing_pose, 0);
        assert_eq!(studio.generation_blocker(), Some(GenerationBlocker::MissingFace));
        studio.with_scene(|scene| {
            assert_eq!(scene.uploaded_pose(), Some(&image("quick-pose")));
            assert_eq!(scene.described_pose(), "pose seen in quick-pose");
        });
    }

    #[tokio::test]
    async fn typed_pose_wins_over_pending_inspiration() {
        let gate = Arc::new(Notify::new());
        let studio = approved_studio(ScriptedProvider {
            text_gate: Some(gate.clone()),
            ..ScriptedProvider::default()
        })
        .await;

        let inspire = studio.inspire_pose();
        let typing = async {
            assert_eq!(studio.in_flight().inspiring_pose, 1);
            studio.set_described_pose("arms crossed");
            gate.notify_one();
        };
        let (result, ()) = tokio::join!(inspire, typing);
        result.expect("inspire");

        assert_eq!(studio.in_flight().inspiring_pose, 0);
        assert_eq!(
            studio.with_scene(|scene| scene.described_pose().to_string()),
            "arms crossed"
        );
    }

    #[tokio::test]
    async fn inspiration_requires_approved_garment() {
        let studio = Studio::new(ScriptedProvider::default());
        let err = studio.inspire_pose().await.expect_err("nothing approved");
        assert_eq!(
            err.to_string(),
            "Please approve a product image first to get inspired."
        );

        let studio = approved_studio(ScriptedProvider::default()).await;
        studio.inspire_background().await.expect("inspire background");
        studio.inspire_pose().await.expect("inspire pose");
        studio.with_scene(|scene| {
            assert_eq!(scene.background_mode(), BackgroundMode::Describe);
            assert_eq!(scene.described_background(), "scene for isolated-shirt");
            assert_eq!(scene.pose_mode(), PoseMode::Describe);
            assert_eq!(scene.described_pose(), "pose for isolated-shirt");
        });
    }

    #[tokio::test]
    async fn ingest_routes_to_focused_target() {
        let studio = Studio::new(ScriptedProvider::default());
        studio.ingest(image("me")).await.expect("face");
        assert_eq!(studio.with_scene(|scene| scene.face().cloned()), Some(image("me")));

        studio.set_upload_target(UploadTarget::Product);
        studio.switch_category(GarmentCategory::Lower);
        studio.ingest(image("jeans")).await.expect("product");
        assert_eq!(
            studio.product_status(GarmentCategory::Lower),
            ProductStatus::PendingApproval
        );

        studio.set_upload_target("background".parse().expect("target"));
        studio.ingest(image("roof")).await.expect("background");
        studio.with_scene(|scene| {
            assert_eq!(scene.background_mode(), BackgroundMode::Describe);
            assert_eq!(scene.uploaded_background(), Some(&image("roof")));
        });
    }

    #[tokio::test]
    async fn status_reports_quota_problems() {
        let studio = Studio::new(ScriptedProvider::default());
        let status = studio.check_status().await;
        assert_eq!(status.message(), "API Status: Quota Exceeded");
    }
}
