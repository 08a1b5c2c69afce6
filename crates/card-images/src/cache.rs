//! Tiered image cache
//!
//! Every unique side is resolved from the most processed file available:
//! gamma corrected, then DPI scaled, then raw download, then the network.
//! Each tier that had to be computed is written back so the next run starts
//! one step further along.

use crate::fetch::ImageFetcher;
use crate::paths::CachePaths;
use crate::process::*;
use crate::types::*;
use deck_resolver::{ImageSource, PrintUnit, Side};
use image::RgbImage;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tokio::task::JoinSet;

/// Ready-to-place bitmaps keyed by side key.
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    images: HashMap<String, Arc<RgbImage>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Arc<RgbImage>> {
        self.images.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, image: RgbImage) {
        self.images.insert(key.into(), Arc::new(image));
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Counters for one cache build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub downloaded: usize,
    pub scaled: usize,
    pub gamma_corrected: usize,
}

#[derive(Debug, Default)]
struct Counters {
    downloaded: AtomicUsize,
    scaled: AtomicUsize,
    gamma_corrected: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            downloaded: self.downloaded.load(Ordering::Relaxed),
            scaled: self.scaled.load(Ordering::Relaxed),
            gamma_corrected: self.gamma_corrected.load(Ordering::Relaxed),
        }
    }
}

/// Distinct sides of all units, in first occurrence order.
pub fn unique_sides(units: &[PrintUnit]) -> Vec<Side> {
    let mut seen = HashSet::new();
    units
        .iter()
        .flat_map(|unit| unit.sides.iter())
        .filter(|side| seen.insert(side.key.clone()))
        .cloned()
        .collect()
}

struct Worker<F> {
    options: CacheOptions,
    paths: CachePaths,
    fetcher: F,
    counters: Counters,
    /// Start of the most recent request to the image host, shared by all
    /// workers
    last_request: Mutex<Option<Instant>>,
}

/// Fills an [`ImageCache`] for a list of print units.
pub struct ImageCacheBuilder<F> {
    worker: Arc<Worker<F>>,
}

impl<F: ImageFetcher> ImageCacheBuilder<F> {
    pub fn new(options: CacheOptions, fetcher: F) -> Result<Self> {
        options.validate()?;
        let paths = CachePaths::new(&options.root, options.image_type, options.dpi);
        Ok(Self {
            worker: Arc::new(Worker {
                options,
                paths,
                fetcher,
                counters: Counters::default(),
                last_request: Mutex::new(None),
            }),
        })
    }

    pub fn paths(&self) -> &CachePaths {
        &self.worker.paths
    }

    pub fn stats(&self) -> CacheStats {
        self.worker.counters.snapshot()
    }

    /// Resolve every side referenced by `units`.
    ///
    /// Fails on the first side that cannot be resolved; the remaining
    /// workers are cancelled.
    pub async fn build(&self, units: &[PrintUnit]) -> Result<ImageCache> {
        let started = Instant::now();
        self.worker.paths.ensure_directories().await?;

        let sides = unique_sides(units);
        log::info!(
            "Preparing {} unique images with {} workers",
            sides.len(),
            self.worker.options.worker_threads
        );

        let semaphore = Arc::new(Semaphore::new(self.worker.options.worker_threads));
        let mut tasks = JoinSet::new();
        for side in sides {
            let semaphore = semaphore.clone();
            let worker = self.worker.clone();
            tasks.spawn(async move {
                // A closed pool means another worker already failed
                let Ok(_permit) = semaphore.clone().acquire_owned().await else {
                    return Ok(None);
                };
                match worker.resolve(&side).await {
                    Ok(image) => Ok(Some((side.key, image))),
                    Err(e) => {
                        semaphore.close();
                        Err(e)
                    }
                }
            });
        }

        let mut cache = ImageCache::new();
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(ImageError::from).and_then(|result| result);
            match outcome {
                Ok(Some((key, image))) => cache.insert(key, image),
                Ok(None) => {}
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        let stats = self.stats();
        log::info!(
            "Images ready in {:.2?}: {} cached, {} downloaded, {} scaled, {} gamma corrected",
            started.elapsed(),
            cache.len(),
            stats.downloaded,
            stats.scaled,
            stats.gamma_corrected
        );
        Ok(cache)
    }
}

impl<F: ImageFetcher> Worker<F> {
    async fn resolve(&self, side: &Side) -> Result<RgbImage> {
        match &side.source {
            ImageSource::Remote { url } => self.remote(&side.key, url, side.black_border).await,
            ImageSource::CustomCard { name } => {
                self.local(self.paths.custom_source(name), self.paths.custom_scaled(name))
                    .await
            }
            ImageSource::Backside { file } => {
                self.local(
                    self.paths.backside_source(file),
                    self.paths.backside_scaled(file),
                )
                .await
            }
        }
    }

    async fn remote(&self, key: &str, url: &str, black_border: bool) -> Result<RgbImage> {
        let correct = self.options.gamma_correction && black_border;
        let gamma_path = self.paths.gamma_path(key);
        if correct && tokio::fs::try_exists(&gamma_path).await? {
            log::debug!("{key}: using {}", gamma_path.display());
            return load_rgb(gamma_path).await;
        }

        let scaled_path = self.paths.scaled_path(key);
        let scaled = if tokio::fs::try_exists(&scaled_path).await? {
            log::debug!("{key}: using {}", scaled_path.display());
            load_rgb(scaled_path).await?
        } else {
            let raw_path = self.paths.raw_path(key);
            let raw = if tokio::fs::try_exists(&raw_path).await? {
                log::debug!("{key}: scaling {}", raw_path.display());
                let path = raw_path.clone();
                tokio::task::spawn_blocking(move || open_image(&path)).await??
            } else {
                self.download(key, url, raw_path).await?
            };
            self.scale_and_save(raw, scaled_path).await?
        };

        if !correct {
            return Ok(scaled);
        }

        let key_owned = key.to_string();
        let corrected = tokio::task::spawn_blocking(move || {
            let (image, outcome) = gamma_correct(scaled)?;
            match outcome {
                GammaOutcome::Skipped { brightness } => log::debug!(
                    "{key_owned}: border brightness {brightness:.1} is not a black border"
                ),
                GammaOutcome::Corrected { passes, brightness } => log::debug!(
                    "{key_owned}: border corrected to {brightness:.1} in {passes} passes"
                ),
                GammaOutcome::Stalled { passes, brightness } => log::warn!(
                    "{key_owned}: border correction stopped at {brightness:.1} after {passes} passes"
                ),
            }
            save_image(&image, &gamma_path)?;
            Ok::<_, ImageError>(image)
        })
        .await??;
        self.counters.gamma_corrected.fetch_add(1, Ordering::Relaxed);
        Ok(corrected)
    }

    /// Custom or backside art: the scaled copy if present, else the source.
    async fn local(&self, source: PathBuf, scaled_path: PathBuf) -> Result<RgbImage> {
        if tokio::fs::try_exists(&scaled_path).await? {
            return load_rgb(scaled_path).await;
        }
        if !tokio::fs::try_exists(&source).await? {
            return Err(ImageError::MissingSource { path: source });
        }
        let image = tokio::task::spawn_blocking(move || open_image(&source)).await??;
        self.scale_and_save(image, scaled_path).await
    }

    async fn scale_and_save(
        &self,
        image: image::DynamicImage,
        path: PathBuf,
    ) -> Result<RgbImage> {
        let (width, height) = (self.options.card_width_px, self.options.card_height_px);
        let scaled = tokio::task::spawn_blocking(move || {
            let scaled = scale_to_card(&image, width, height);
            save_image(&scaled, &path)?;
            Ok::<_, ImageError>(scaled)
        })
        .await??;
        self.counters.scaled.fetch_add(1, Ordering::Relaxed);
        Ok(scaled)
    }

    /// Wait until `rate_limit_delay_ms` has passed since the previous request
    /// from any worker.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let delay = Duration::from_millis(self.options.rate_limit_delay_ms);
            tokio::time::sleep_until(previous + delay).await;
        }
        *last = Some(Instant::now());
    }

    /// Download with retries. The bytes are only written once they decode.
    async fn download(
        &self,
        key: &str,
        url: &str,
        raw_path: PathBuf,
    ) -> Result<image::DynamicImage> {
        let max_attempts = self.options.max_attempts;
        let mut attempt = 0;
        let bytes = loop {
            attempt += 1;
            self.pace().await;
            match self.fetcher.fetch(url).await {
                Ok(bytes) => break bytes,
                Err(e) if attempt < max_attempts => {
                    let delay = self.options.retry_backoff_ms * 2u64.pow(attempt - 1);
                    log::warn!(
                        "{key}: download attempt {attempt}/{max_attempts} failed: {e}; retrying in {delay}ms"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => {
                    return Err(ImageError::Download {
                        url: url.to_string(),
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
            }
        };
        log::info!("{key}: downloaded {} bytes", bytes.len());

        let origin = url.to_string();
        let image = tokio::task::spawn_blocking(move || {
            let image = decode_image(&bytes, &origin)?;
            std::fs::write(&raw_path, &bytes)?;
            Ok::<_, ImageError>(image)
        })
        .await??;
        self.counters.downloaded.fetch_add(1, Ordering::Relaxed);
        Ok(image)
    }
}

async fn load_rgb(path: PathBuf) -> Result<RgbImage> {
    tokio::task::spawn_blocking(move || open_image(&path).map(|image| image.to_rgb8())).await?
}
