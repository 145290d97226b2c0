use std::fmt;
use std::str::FromStr;

use crate::catalog::{BackgroundOption, Pose};
use crate::studio::image::ImageData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GarmentCategory {
    Upper,
    Lower,
    Full,
}

impl GarmentCategory {
    pub const ALL: [GarmentCategory; 3] = [
        GarmentCategory::Upper,
        GarmentCategory::Lower,
        GarmentCategory::Full,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GarmentCategory::Upper => "upper",
            GarmentCategory::Lower => "lower",
            GarmentCategory::Full => "full",
        }
    }

    fn index(self) -> usize {
        match self {
            GarmentCategory::Upper => 0,
            GarmentCategory::Lower => 1,
            GarmentCategory::Full => 2,
        }
    }
}

impl fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GarmentCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "upper" => Ok(GarmentCategory::Upper),
            "lower" => Ok(GarmentCategory::Lower),
            "full" => Ok(GarmentCategory::Full),
            other => Err(format!(
                "Unknown garment category '{other}', expected upper, lower or full"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    Idle,
    Rendering,
    PendingApproval,
    Approved,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Idle => "idle",
            ProductStatus::Rendering => "rendering",
            ProductStatus::PendingApproval => "pending_approval",
            ProductStatus::Approved => "approved",
        }
    }
}

#[derive(Debug, Clone, Default)]
enum ProductStage {
    #[default]
    Idle,
    Rendering {
        original: ImageData,
    },
    PendingApproval {
        original: ImageData,
        rendered: ImageData,
    },
    Approved {
        original: ImageData,
        rendered: ImageData,
    },
}

/// Lifecycle of one garment category. The rendered image only exists in the
/// pending-approval and approved stages.
#[derive(Debug, Clone, Default)]
pub struct ProductState {
    stage: ProductStage,
    render_seq: u64,
}

impl ProductState {
    pub fn status(&self) -> ProductStatus {
        match self.stage {
            ProductStage::Idle => ProductStatus::Idle,
            ProductStage::Rendering { .. } => ProductStatus::Rendering,
            ProductStage::PendingApproval { .. } => ProductStatus::PendingApproval,
            ProductStage::Approved { .. } => ProductStatus::Approved,
        }
    }

    pub fn original(&self) -> Option<&ImageData> {
        match &self.stage {
            ProductStage::Idle => None,
            ProductStage::Rendering { original }
            | ProductStage::PendingApproval { original, .. }
            | ProductStage::Approved { original, .. } => Some(original),
        }
    }

    pub fn rendered(&self) -> Option<&ImageData> {
        match &self.stage {
            ProductStage::PendingApproval { rendered, .. }
            | ProductStage::Approved { rendered, .. } => Some(rendered),
            _ => None,
        }
    }

    pub fn approved_garment(&self) -> Option<&ImageData> {
        match &self.stage {
            ProductStage::Approved { rendered, .. } => Some(rendered),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.stage = ProductStage::Idle;
        self.render_seq += 1;
    }
}

/// Identifies one in-flight garment render. Captured when the upload starts so
/// the result lands in the category it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    pub category: GarmentCategory,
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot {action} the {category} garment while it is {}", .from.as_str())]
pub struct InvalidTransition {
    pub category: GarmentCategory,
    pub from: ProductStatus,
    pub action: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseMode {
    Select,
    Describe,
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundMode {
    None,
    Select,
    Upload,
    Describe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariationCount(u8);

impl VariationCount {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(value: u8) -> Self {
        VariationCount(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_multi(self) -> bool {
        self.0 > 1
    }
}

impl Default for VariationCount {
    fn default() -> Self {
        VariationCount(Self::MIN)
    }
}

#[derive(Debug, Clone)]
pub struct SceneConfig {
    face: Option<ImageData>,
    products: [ProductState; 3],
    category: GarmentCategory,
    pose_mode: PoseMode,
    selected_pose: Option<&'static Pose>,
    described_pose: String,
    uploaded_pose: Option<ImageData>,
    background_mode: BackgroundMode,
    selected_background: Option<&'static BackgroundOption>,
    described_background: String,
    uploaded_background: Option<ImageData>,
    variations: VariationCount,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            face: None,
            products: Default::default(),
            category: GarmentCategory::Upper,
            pose_mode: PoseMode::Select,
            selected_pose: None,
            described_pose: String::new(),
            uploaded_pose: None,
            background_mode: BackgroundMode::None,
            selected_background: None,
            described_background: String::new(),
            uploaded_background: None,
            variations: VariationCount::default(),
        }
    }
}

impl SceneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn face(&self) -> Option<&ImageData> {
        self.face.as_ref()
    }

    pub fn set_face(&mut self, image: ImageData) {
        self.face = Some(image);
    }

    pub fn category(&self) -> GarmentCategory {
        self.category
    }

    pub fn switch_category(&mut self, category: GarmentCategory) -> bool {
        if self.category == category {
            return false;
        }
        self.category = category;
        true
    }

    pub fn product(&self, category: GarmentCategory) -> &ProductState {
        &self.products[category.index()]
    }

    fn product_mut(&mut self, category: GarmentCategory) -> &mut ProductState {
        &mut self.products[category.index()]
    }

    pub fn active_product(&self) -> &ProductState {
        self.product(self.category)
    }

    pub fn begin_render(&mut self, category: GarmentCategory, original: ImageData) -> RenderTicket {
        let product = self.product_mut(category);
        product.render_seq += 1;
        product.stage = ProductStage::Rendering { original };
        RenderTicket {
            category,
            seq: product.render_seq,
        }
    }

    fn is_current(&self, ticket: RenderTicket) -> bool {
        let product = self.product(ticket.category);
        product.render_seq == ticket.seq && product.status() == ProductStatus::Rendering
    }

    pub fn complete_render(&mut self, ticket: RenderTicket, rendered: ImageData) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let product = self.product_mut(ticket.category);
        if let ProductStage::Rendering { original } = std::mem::take(&mut product.stage) {
            product.stage = ProductStage::PendingApproval { original, rendered };
        }
        true
    }

    pub fn fail_render(&mut self, ticket: RenderTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.product_mut(ticket.category).reset();
        true
    }

    pub fn approve(&mut self, category: GarmentCategory) -> Result<(), InvalidTransition> {
        let product = self.product_mut(category);
        match std::mem::take(&mut product.stage) {
            ProductStage::PendingApproval { original, rendered } => {
                product.stage = ProductStage::Approved { original, rendered };
                Ok(())
            }
            other => {
                product.stage = other;
                Err(InvalidTransition {
                    category,
                    from: product.status(),
                    action: "approve",
                })
            }
        }
    }

    pub fn reject(&mut self, category: GarmentCategory) -> Result<(), InvalidTransition> {
        let product = self.product_mut(category);
        match product.status() {
            ProductStatus::PendingApproval | ProductStatus::Approved => {
                product.reset();
                Ok(())
            }
            from => Err(InvalidTransition {
                category,
                from,
                action: "reject",
            }),
        }
    }

    pub fn pose_mode(&self) -> PoseMode {
        self.pose_mode
    }

    /// Select and upload are unavailable with several variations; those
    /// requests fall back to describe. Returns the mode actually applied.
    pub fn set_pose_mode(&mut self, mode: PoseMode) -> PoseMode {
        self.pose_mode = match mode {
            PoseMode::Select | PoseMode::Upload if self.variations.is_multi() => PoseMode::Describe,
            other => other,
        };
        self.pose_mode
    }

    pub fn selected_pose(&self) -> Option<&'static Pose> {
        self.selected_pose
    }

    pub fn select_pose(&mut self, pose: &'static Pose) {
        self.selected_pose = Some(pose);
    }

    pub fn described_pose(&self) -> &str {
        &self.described_pose
    }

    pub fn set_described_pose(&mut self, text: impl Into<String>) {
        self.described_pose = text.into();
    }

    pub fn uploaded_pose(&self) -> Option<&ImageData> {
        self.uploaded_pose.as_ref()
    }

    pub fn set_uploaded_pose(&mut self, image: ImageData) {
        self.uploaded_pose = Some(image);
    }

    pub fn background_mode(&self) -> BackgroundMode {
        self.background_mode
    }

    pub fn set_background_mode(&mut self, mode: BackgroundMode) {
        self.background_mode = mode;
    }

    pub fn selected_background(&self) -> Option<&'static BackgroundOption> {
        self.selected_background
    }

    pub fn select_background(&mut self, option: &'static BackgroundOption) {
        self.selected_background = Some(option);
    }

    pub fn described_background(&self) -> &str {
        &self.described_background
    }

    pub fn set_described_background(&mut self, text: impl Into<String>) {
        self.described_background = text.into();
    }

    pub fn uploaded_background(&self) -> Option<&ImageData> {
        self.uploaded_background.as_ref()
    }

    pub fn set_uploaded_background(&mut self, image: ImageData) {
        self.uploaded_background = Some(image);
    }

    pub fn variations(&self) -> VariationCount {
        self.variations
    }

    /// Lowering the count back to one leaves the pose mode on describe.
    pub fn set_variations(&mut self, count: u8) -> VariationCount {
        self.variations = VariationCount::new(count);
        if self.variations.is_multi() {
            self.set_pose_mode(self.pose_mode);
        }
        self.variations
    }

    pub fn increment_variations(&mut self) -> VariationCount {
        self.set_variations(self.variations.get().saturating_add(1))
    }

    pub fn decrement_variations(&mut self) -> VariationCount {
        self.set_variations(self.variations.get().saturating_sub(1))
    }
}
