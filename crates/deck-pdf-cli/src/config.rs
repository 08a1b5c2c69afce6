use anyhow::{Context, Result, bail};
use card_images::CacheOptions;
use card_sheets::{CARD_HEIGHT_MM, CARD_WIDTH_MM, SheetOptions, mm_to_px};
use deck_resolver::{HttpIdentity, ImageType, PrintMode, ResolveOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "deckpdf.json";

/// Settings shared by every command, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckPdfConfig {
    pub two_sided: bool,
    pub split_double_faced: bool,
    pub custom_backside: bool,
    /// File name of the shared back inside `cardbacks/`
    pub backside: String,
    pub image_type: ImageType,
    pub spacing_mm: f64,
    pub gamma_correction: bool,
    pub reference_points: bool,
    pub background_box: bool,
    pub stagger: bool,
    pub x_axis_offset_mm: f64,
    pub user_agent: String,
    pub accept: String,
    pub worker_threads: usize,
    pub render_threads: usize,
    pub dpi: u32,
    /// Bulk card data file, relative to `data_dir` unless absolute
    pub bulk_json_path: PathBuf,
    /// Root of `image_cache/`, `custom_cards/` and `cardbacks/`
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for DeckPdfConfig {
    fn default() -> Self {
        let identity = HttpIdentity::default();
        Self {
            two_sided: false,
            split_double_faced: false,
            custom_backside: false,
            backside: "back.png".to_string(),
            image_type: ImageType::Png,
            spacing_mm: 0.0,
            gamma_correction: true,
            reference_points: true,
            background_box: true,
            stagger: true,
            x_axis_offset_mm: 0.75,
            user_agent: identity.user_agent,
            accept: identity.accept,
            worker_threads: 4,
            render_threads: 2,
            dpi: 600,
            bulk_json_path: PathBuf::from("bulk/default-cards.json"),
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl DeckPdfConfig {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config, writing the defaults first if the file is missing.
    pub async fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            log::info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save(path).await?;
            return Ok(config);
        }
        Self::load(path).await
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        tokio::fs::write(path.as_ref(), json)
            .await
            .with_context(|| format!("Failed to write config {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            bail!("dpi must be greater than 0");
        }
        if self.worker_threads == 0 || self.render_threads == 0 {
            bail!("worker_threads and render_threads must be at least 1");
        }
        if self.spacing_mm < 0.0 {
            bail!("spacing_mm must not be negative (got {})", self.spacing_mm);
        }
        if self.backside.trim().is_empty() {
            bail!("backside must name a file in cardbacks/");
        }
        Ok(())
    }

    pub fn print_mode(&self) -> PrintMode {
        PrintMode {
            two_sided: self.two_sided,
            split_double_faced: self.split_double_faced,
            custom_backside: self.custom_backside,
        }
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            mode: self.print_mode(),
            image_type: self.image_type,
            backside: self.backside.clone(),
        }
    }

    pub fn http_identity(&self) -> HttpIdentity {
        HttpIdentity {
            user_agent: self.user_agent.clone(),
            accept: self.accept.clone(),
        }
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            root: self.data_dir.clone(),
            image_type: self.image_type,
            dpi: self.dpi,
            card_width_px: mm_to_px(CARD_WIDTH_MM, self.dpi).max(1) as u32,
            card_height_px: mm_to_px(CARD_HEIGHT_MM, self.dpi).max(1) as u32,
            gamma_correction: self.gamma_correction,
            worker_threads: self.worker_threads,
            ..Default::default()
        }
    }

    pub fn sheet_options(&self) -> SheetOptions {
        SheetOptions {
            dpi: self.dpi,
            spacing_mm: self.spacing_mm,
            x_axis_offset_mm: self.x_axis_offset_mm,
            background_box: self.background_box,
            reference_points: self.reference_points,
            two_sided: self.two_sided,
            stagger: self.stagger,
            render_threads: self.render_threads,
        }
    }

    pub fn bulk_path(&self) -> PathBuf {
        self.data_dir.join(&self.bulk_json_path)
    }

    /// `<output_dir>/<deck stem>.pdf`
    pub fn output_path(&self, deck: &Path) -> PathBuf {
        let stem = deck
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "deck".to_string());
        self.output_dir.join(format!("{stem}.pdf"))
    }
}
