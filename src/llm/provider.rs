use crate::error::ProviderError;
use crate::studio::image::ImageData;
use crate::studio::scene::GarmentCategory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundInput {
    Image(ImageData),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variation {
    pub index: u8,
    pub total: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub face: ImageData,
    pub garment: ImageData,
    pub category: GarmentCategory,
    pub pose: String,
    pub background: Option<BackgroundInput>,
    pub variation: Variation,
}

#[allow(async_fn_in_trait)]
pub trait TryOnProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String, ProviderError>;

    async fn isolate_garment(&self, garment: &ImageData) -> Result<String, ProviderError>;

    async fn describe_pose(&self, image: &ImageData) -> Result<String, ProviderError>;

    async fn describe_background(&self, image: &ImageData) -> Result<String, ProviderError>;

    async fn suggest_pose(&self, garment: &ImageData) -> Result<String, ProviderError>;

    async fn suggest_background(&self, garment: &ImageData) -> Result<String, ProviderError>;

    async fn ping(&self) -> Result<(), ProviderError>;
}
