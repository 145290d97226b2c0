use crate::error::StudioError;
use crate::llm::provider::{BackgroundInput, SynthesisRequest, Variation};
use crate::studio::scene::{BackgroundMode, PoseMode, SceneConfig};

pub const DEFAULT_POSE_TEXT: &str = "A model in a natural standing pose";

/// Pose text sent to the provider. Uploaded poses travel as their
/// description, never as the raw image.
pub fn resolve_pose_text(scene: &SceneConfig) -> String {
    let use_described = scene.variations().is_multi()
        || matches!(scene.pose_mode(), PoseMode::Describe | PoseMode::Upload);
    if use_described {
        return scene.described_pose().to_string();
    }
    scene
        .selected_pose()
        .map(|pose| pose.description.to_string())
        .unwrap_or_else(|| DEFAULT_POSE_TEXT.to_string())
}

pub fn resolve_background(scene: &SceneConfig) -> Option<BackgroundInput> {
    match scene.background_mode() {
        BackgroundMode::None => None,
        BackgroundMode::Upload => scene
            .uploaded_background()
            .cloned()
            .map(BackgroundInput::Image),
        BackgroundMode::Describe => {
            Some(BackgroundInput::Text(scene.described_background().to_string()))
        }
        BackgroundMode::Select => scene
            .selected_background()
            .map(|option| BackgroundInput::Text(option.description.to_string())),
    }
}

pub fn build_generation_requests(scene: &SceneConfig) -> Result<Vec<SynthesisRequest>, StudioError> {
    let face = scene
        .face()
        .cloned()
        .ok_or_else(|| StudioError::validation("Missing required image data."))?;
    let garment = scene
        .active_product()
        .approved_garment()
        .cloned()
        .ok_or_else(|| StudioError::validation("Missing required image data."))?;

    let category = scene.category();
    let pose = resolve_pose_text(scene);
    let background = resolve_background(scene);
    let total = scene.variations().get();

    Ok((1..=total)
        .map(|index| SynthesisRequest {
            face: face.clone(),
            garment: garment.clone(),
            category,
            pose: pose.clone(),
            background: background.clone(),
            variation: Variation { index, total },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{find_background, find_pose};
    use crate::studio::image::ImageData;
    use crate::studio::scene::GarmentCategory;

    fn ready_scene() -> SceneConfig {
        let mut scene = SceneConfig::new();
        scene.set_face(ImageData::new("face", "image/jpeg"));
        let ticket = scene.begin_render(GarmentCategory::Upper, ImageData::new("raw-shirt", "image/jpeg"));
        scene.complete_render(ticket, ImageData::png("isolated-shirt"));
        scene.approve(GarmentCategory::Upper).expect("approve");
        scene
    }

    #[test]
    fn selected_pose_without_background_yields_single_request() {
        let mut scene = ready_scene();
        let pose = find_pose(3).expect("pose 3");
        scene.select_pose(pose);

        let requests = build_generation_requests(&scene).expect("requests");
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.category, GarmentCategory::Upper);
        assert_eq!(request.pose, pose.description);
        assert_eq!(request.background, None);
        assert_eq!(request.variation, Variation { index: 1, total: 1 });
        assert_eq!(request.garment, ImageData::png("isolated-shirt"));
        assert_eq!(request.face, ImageData::new("face", "image/jpeg"));
    }

    #[test]
    fn uploaded_pose_is_sent_as_description() {
        let mut scene = ready_scene();
        scene.set_uploaded_pose(ImageData::new("pose-photo", "image/png"));
        scene.set_described_pose("one knee raised");
        scene.set_pose_mode(PoseMode::Upload);
        assert_eq!(resolve_pose_text(&scene), "one knee raised");
    }

    #[test]
    fn select_mode_without_choice_uses_fallback_text() {
        let scene = ready_scene();
        assert_eq!(resolve_pose_text(&scene), DEFAULT_POSE_TEXT);
    }

    #[test]
    fn multi_variation_uses_described_pose_and_indexes_requests() {
        let mut scene = ready_scene();
        scene.select_pose(find_pose(1).expect("pose"));
        scene.set_described_pose("striding");
        scene.set_variations(3);

        let requests = build_generation_requests(&scene).expect("requests");
        let markers: Vec<_> = requests.iter().map(|r| (r.variation.index, r.variation.total)).collect();
        assert_eq!(markers, vec![(1, 3), (2, 3), (3, 3)]);
        assert!(requests
            .iter()
            .all(|r| r.pose == "striding"));
    }

    #[test]
    fn background_resolution_per_mode() {
        let mut scene = ready_scene();
        let option = find_background(2).expect("background 2");
        scene.select_background(option);
        scene.set_described_background("neon alley");
        scene.set_uploaded_background(ImageData::new("bg", "image/webp"));

        assert_eq!(resolve_background(&scene), None);

        scene.set_background_mode(BackgroundMode::Select);
        assert_eq!(
            resolve_background(&scene),
            Some(BackgroundInput::Text(option.description.to_string()))
        );

        scene.set_background_mode(BackgroundMode::Describe);
        assert_eq!(
            resolve_background(&scene),
            Some(BackgroundInput::Text("neon alley".to_string()))
        );

        scene.set_background_mode(BackgroundMode::Upload);
        assert_eq!(
            resolve_background(&scene),
            Some(BackgroundInput::Image(ImageData::new("bg", "image/webp")))
        );
    }

    #[test]
    fn missing_images_are_a_validation_error() {
        let scene = SceneConfig::new();
        assert!(matches!(
            build_generation_requests(&scene),
            Err(StudioError::Validation(_))
        ));
    }
}
