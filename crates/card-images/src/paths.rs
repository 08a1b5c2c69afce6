//! On-disk cache layout
//!
//! ```text
//! image_cache/<type>/<key>.<ext>            raw download
//! image_cache/<dpi>/<type>/<key>.<ext>      scaled to the print DPI
//! image_cache/<dpi>/<type>/<key>_gc.<ext>   scaled and gamma corrected
//! custom_cards/<name>.png                   custom art
//! custom_cards/<dpi>/<name>.<ext>           custom art, scaled
//! cardbacks/<file>                          backside art
//! cardbacks/<dpi>/<file>                    backside art, scaled
//! ```

use deck_resolver::ImageType;
use std::path::{Path, PathBuf};

pub const IMAGE_CACHE_DIR: &str = "image_cache";
pub const CUSTOM_CARDS_DIR: &str = "custom_cards";
pub const CARDBACKS_DIR: &str = "cardbacks";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    root: PathBuf,
    image_type: ImageType,
    dpi: u32,
}

impl CachePaths {
    pub fn new(root: impl Into<PathBuf>, image_type: ImageType, dpi: u32) -> Self {
        Self {
            root: root.into(),
            image_type,
            dpi,
        }
    }

    fn ext(&self) -> &'static str {
        self.image_type.extension()
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(IMAGE_CACHE_DIR).join(self.image_type.name())
    }

    pub fn scaled_dir(&self) -> PathBuf {
        self.root
            .join(IMAGE_CACHE_DIR)
            .join(self.dpi.to_string())
            .join(self.image_type.name())
    }

    pub fn custom_dir(&self) -> PathBuf {
        self.root.join(CUSTOM_CARDS_DIR)
    }

    pub fn custom_scaled_dir(&self) -> PathBuf {
        self.custom_dir().join(self.dpi.to_string())
    }

    pub fn backside_dir(&self) -> PathBuf {
        self.root.join(CARDBACKS_DIR)
    }

    pub fn backside_scaled_dir(&self) -> PathBuf {
        self.backside_dir().join(self.dpi.to_string())
    }

    pub fn raw_path(&self, key: &str) -> PathBuf {
        self.raw_dir().join(format!("{key}.{}", self.ext()))
    }

    pub fn scaled_path(&self, key: &str) -> PathBuf {
        self.scaled_dir().join(format!("{key}.{}", self.ext()))
    }

    pub fn gamma_path(&self, key: &str) -> PathBuf {
        self.scaled_dir().join(format!("{key}_gc.{}", self.ext()))
    }

    pub fn custom_source(&self, name: &str) -> PathBuf {
        self.custom_dir().join(format!("{name}.png"))
    }

    pub fn custom_scaled(&self, name: &str) -> PathBuf {
        self.custom_scaled_dir().join(format!("{name}.{}", self.ext()))
    }

    pub fn backside_source(&self, file: &str) -> PathBuf {
        self.backside_dir().join(file)
    }

    pub fn backside_scaled(&self, file: &str) -> PathBuf {
        self.backside_scaled_dir().join(file)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create every directory the cache writes into.
    pub async fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [
            self.raw_dir(),
            self.scaled_dir(),
            self.custom_scaled_dir(),
            self.backside_scaled_dir(),
        ] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }
}
