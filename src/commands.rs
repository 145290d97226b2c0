use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{info, warn};

use crate::catalog::{find_background, find_pose};
use crate::config::CONFIG;
use crate::gallery::Gallery;
use crate::llm::{GeminiProvider, TryOnProvider};
use crate::storage::{LocalStore, Theme};
use crate::studio::image::ImageData;
use crate::studio::scene::{BackgroundMode, GarmentCategory, PoseMode, ProductStatus, VariationCount};
use crate::studio::{Studio, UploadTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoseChoice {
    Catalog(u32),
    Text(String),
    Image(PathBuf),
    Inspire,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundChoice {
    None,
    Catalog(u32),
    Text(String),
    Image(PathBuf),
    Inspire,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateArgs {
    pub face: PathBuf,
    pub garment: PathBuf,
    pub category: GarmentCategory,
    pub pose: Option<PoseChoice>,
    pub background: BackgroundChoice,
    pub variations: u8,
    pub auto_approve: bool,
    pub save_to_gallery: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryAction {
    List,
    Delete(usize),
    Clear,
    Export,
}

pub fn require_api_key(command: &str) -> Result<()> {
    if !CONFIG.has_gemini_api_key() {
        bail!("GEMINI_API_KEY is required for {command}");
    }
    Ok(())
}

pub fn check_generate_plan(args: &GenerateArgs) -> Result<()> {
    let multi = VariationCount::new(args.variations).is_multi();
    match &args.pose {
        None => bail!("A pose is required: pass --pose, --pose-text, --pose-image or --inspire-pose"),
        Some(PoseChoice::Catalog(_)) if multi => bail!(
            "Multiple variations need a described pose: use --pose-text, --pose-image or --inspire-pose"
        ),
        Some(PoseChoice::Catalog(id)) if find_pose(*id).is_none() => {
            bail!("Unknown pose id {id}; run `tryon-studio catalog` for the list")
        }
        Some(PoseChoice::Text(text)) if text.trim().is_empty() => bail!("--pose-text is empty"),
        _ => {}
    }
    if let BackgroundChoice::Catalog(id) = &args.background {
        if find_background(*id).is_none() {
            bail!("Unknown background id {id}; run `tryon-studio catalog` for the list");
        }
    }
    Ok(())
}

fn new_studio() -> Studio<GeminiProvider> {
    Studio::new(GeminiProvider::from_config(&CONFIG))
}

fn open_store() -> LocalStore {
    LocalStore::new(CONFIG.storage_path.clone())
}

pub fn download_name(index: usize) -> String {
    format!("virtual-try-on-{}.png", index + 1)
}

pub async fn write_results(images: &[String], dir: &Path) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut written = Vec::with_capacity(images.len());
    for (index, uri) in images.iter().enumerate() {
        let image = ImageData::from_data_uri(uri)
            .ok_or_else(|| anyhow!("Result {} is not a data URI", index + 1))?;
        let path = dir.join(download_name(index));
        tokio::fs::write(&path, image.decode()?)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub async fn run_status() -> Result<String> {
    require_api_key("status")?;
    let status = new_studio().check_status().await;
    Ok(status.message().to_string())
}

pub async fn run_describe(target: UploadTarget, path: &Path) -> Result<String> {
    require_api_key("describe")?;
    let studio = new_studio();
    let image = ImageData::from_file(path).await?;
    studio.set_upload_target(target);
    studio.ingest(image).await?;
    let text = studio.with_scene(|scene| match target {
        UploadTarget::Background => scene.described_background().to_string(),
        _ => scene.described_pose().to_string(),
    });
    Ok(text)
}

pub async fn run_generate(args: GenerateArgs) -> Result<Vec<PathBuf>> {
    check_generate_plan(&args)?;
    require_api_key("generate")?;
    let studio = new_studio();
    info!(
        "Starting try-on with {} provider for {} garment",
        studio.provider().name(),
        args.category
    );

    studio.set_face(ImageData::from_file(&args.face).await?);
    studio.switch_category(args.category);
    let garment = ImageData::from_file(&args.garment).await?;
    studio.set_upload_target(UploadTarget::Product);
    studio.ingest(garment).await?;

    if studio.product_status(args.category) != ProductStatus::PendingApproval {
        bail!("Garment render did not finish");
    }
    let rendered = studio
        .with_scene(|scene| scene.product(args.category).rendered().cloned())
        .ok_or_else(|| anyhow!("Garment render produced no image"))?;
    let preview = CONFIG
        .output_dir
        .join(format!("garment-{}.png", args.category));
    tokio::fs::create_dir_all(&CONFIG.output_dir).await?;
    tokio::fs::write(&preview, rendered.decode()?).await?;
    println!("Rendered garment written to {}", preview.display());

    if !args.auto_approve && !confirm("Approve this garment?")? {
        studio.reject_product(args.category)?;
        bail!("Garment rejected; upload a different image to try again.");
    }
    studio.approve_product(args.category)?;

    let count = studio.set_variations(args.variations);
    if count.get() != args.variations {
        warn!("Variation count clamped to {}", count.get());
    }

    match &args.background {
        BackgroundChoice::None => studio.set_background_mode(BackgroundMode::None),
        BackgroundChoice::Catalog(id) => {
            studio.select_background(*id)?;
            studio.set_background_mode(BackgroundMode::Select);
        }
        BackgroundChoice::Text(text) => {
            studio.set_described_background(text.clone());
            studio.set_background_mode(BackgroundMode::Describe);
        }
        BackgroundChoice::Image(path) => {
            studio
                .describe_background_from_upload(ImageData::from_file(path).await?)
                .await?;
            studio.set_background_mode(BackgroundMode::Upload);
        }
        BackgroundChoice::Inspire => {
            if let Err(err) = studio.inspire_background().await {
                warn!("Background inspiration failed, using the studio backdrop: {}", err);
                studio.dismiss_error();
                studio.set_background_mode(BackgroundMode::None);
            }
        }
    }

    match &args.pose {
        None => bail!("A pose is required"),
        Some(PoseChoice::Catalog(id)) => {
            studio.select_pose(*id)?;
            studio.set_pose_mode(PoseMode::Select);
        }
        Some(PoseChoice::Text(text)) => {
            studio.set_described_pose(text.clone());
            studio.set_pose_mode(PoseMode::Describe);
        }
        Some(PoseChoice::Image(path)) => {
            studio
                .describe_pose_from_upload(ImageData::from_file(path).await?)
                .await?;
        }
        Some(PoseChoice::Inspire) => studio.inspire_pose().await?,
    }

    if !studio.can_generate() {
        let reason = studio
            .generation_blocker()
            .map(|blocker| blocker.to_string())
            .unwrap_or_default();
        bail!("Not ready to generate: {reason}");
    }
    if let Err(err) = studio.generate().await {
        bail!(studio.error().unwrap_or_else(|| err.to_string()));
    }
    let images = studio.generated().unwrap_or_default();
    let written = write_results(&images, &CONFIG.output_dir).await?;

    if args.save_to_gallery {
        let mut gallery = Gallery::load(open_store());
        let saved = images
            .iter()
            .filter(|image| gallery.save(image.as_str()))
            .count();
        info!("Saved {} new image(s) to the gallery", saved);
    }
    Ok(written)
}

pub async fn run_gallery(action: GalleryAction) -> Result<Vec<String>> {
    let mut gallery = Gallery::load(open_store());
    match action {
        GalleryAction::List => Ok(gallery
            .images()
            .iter()
            .enumerate()
            .map(|(index, uri)| format!("{index}: {} ({} bytes)", download_name(index), uri.len()))
            .collect()),
        GalleryAction::Delete(index) => {
            gallery
                .delete(index)
                .ok_or_else(|| anyhow!("No gallery image at index {index}"))?;
            Ok(vec![format!("Deleted image {index}; {} left", gallery.len())])
        }
        GalleryAction::Clear => {
            gallery.clear();
            Ok(vec!["Gallery cleared".to_string()])
        }
        GalleryAction::Export => {
            let written = write_results(gallery.images(), &CONFIG.output_dir).await?;
            Ok(written.iter().map(|path| path.display().to_string()).collect())
        }
    }
}

pub fn run_theme(value: Option<&str>) -> Result<Theme> {
    let store = open_store();
    let current = Theme::load(&store);
    let next = match value {
        None => return Ok(current),
        Some("toggle") => current.toggled(),
        Some(value) => value.parse::<Theme>().map_err(|err| anyhow!(err))?,
    };
    next.save(&store)?;
    Ok(next)
}
