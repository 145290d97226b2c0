use std::fmt;

use crate::studio::scene::{PoseMode, ProductStatus, SceneConfig};

/// Outstanding provider calls per kind. Calls of one kind may overlap, so each
/// is a count. Garment renders are tracked by the product status itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InFlight {
    pub generating: u32,
    pub inspiring_pose: u32,
    pub inspiring_background: u32,
    pub describing_pose: u32,
    pub describing_background: u32,
}

impl InFlight {
    pub fn any(&self) -> bool {
        [
            self.generating,
            self.inspiring_pose,
            self.inspiring_background,
            self.describing_pose,
            self.describing_background,
        ]
        .iter()
        .any(|count| *count > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationBlocker {
    Busy,
    MissingFace,
    ProductNotApproved(ProductStatus),
    PoseUnresolved(PoseMode),
}

impl fmt::Display for GenerationBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationBlocker::Busy => f.write_str("Another request is still in progress."),
            GenerationBlocker::MissingFace => f.write_str("Please upload a face image."),
            GenerationBlocker::ProductNotApproved(status) => write!(
                f,
                "Please approve the product image first (currently {}).",
                status.as_str()
            ),
            GenerationBlocker::PoseUnresolved(PoseMode::Select) => {
                f.write_str("Please select a pose.")
            }
            GenerationBlocker::PoseUnresolved(PoseMode::Describe) => {
                f.write_str("Please describe the pose.")
            }
            GenerationBlocker::PoseUnresolved(PoseMode::Upload) => {
                f.write_str("Please upload a pose reference image.")
            }
        }
    }
}

pub fn generation_blocker(scene: &SceneConfig, in_flight: &InFlight) -> Option<GenerationBlocker> {
    let status = scene.active_product().status();
    if in_flight.any() || status == ProductStatus::Rendering {
        return Some(GenerationBlocker::Busy);
    }
    if scene.face().is_none() {
        return Some(GenerationBlocker::MissingFace);
    }
    if status != ProductStatus::Approved {
        return Some(GenerationBlocker::ProductNotApproved(status));
    }

    let described = !scene.described_pose().trim().is_empty();
    if scene.variations().is_multi() {
        return (!described).then_some(GenerationBlocker::PoseUnresolved(PoseMode::Describe));
    }

    let mode = scene.pose_mode();
    let resolved = match mode {
        PoseMode::Select => scene.selected_pose().is_some(),
        PoseMode::Describe => described,
        PoseMode::Upload => scene.uploaded_pose().is_some(),
    };
    (!resolved).then_some(GenerationBlocker::PoseUnresolved(mode))
}

pub fn can_generate(scene: &SceneConfig, in_flight: &InFlight) -> bool {
    generation_blocker(scene, in_flight).is_none()
}
