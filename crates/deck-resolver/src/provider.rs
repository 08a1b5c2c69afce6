//! Card metadata lookup
//!
//! [`CardDatabase`] is built from a Scryfall bulk JSON dump. Double-faced cards
//! are registered three times: under their base key and once per face with an
//! `_A` / `_B` suffix.

use crate::types::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Key → descriptor lookup used by the resolver.
pub trait CardDataProvider {
    fn lookup(&self, key: &str) -> std::result::Result<&CardDescriptor, LookupError>;
}

impl CardDataProvider for HashMap<String, CardDescriptor> {
    fn lookup(&self, key: &str) -> std::result::Result<&CardDescriptor, LookupError> {
        self.get(key).ok_or_else(|| LookupError {
            key: key.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardDatabase {
    cards: HashMap<String, CardDescriptor>,
}

impl CardDataProvider for CardDatabase {
    fn lookup(&self, key: &str) -> std::result::Result<&CardDescriptor, LookupError> {
        self.cards.lookup(key)
    }
}

/// Subset of a Scryfall card object
#[derive(Debug, Deserialize)]
struct BulkCard {
    name: String,
    set: String,
    collector_number: String,
    layout: CardLayout,
    border_color: BorderColor,
    image_uris: Option<ImageUris>,
    card_faces: Option<Vec<BulkFace>>,
}

#[derive(Debug, Deserialize)]
struct BulkFace {
    name: String,
    image_uris: Option<ImageUris>,
}

impl CardDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Register a card. Double-faced cards also get one entry per face.
    pub fn insert(&mut self, card: CardDescriptor) {
        if let CardImages::Double(faces) = &card.images {
            for (face, suffix) in faces.iter().zip(["_A", "_B"]) {
                let key = format!("{}{}", card.key, suffix);
                self.cards.insert(
                    key.clone(),
                    CardDescriptor {
                        key,
                        name: face.name.clone(),
                        layout: card.layout,
                        border_color: card.border_color,
                        images: CardImages::Single(face.image_uris.clone()),
                    },
                );
            }
        }
        self.cards.insert(card.key.clone(), card);
    }

    /// Parse a Scryfall bulk JSON array.
    pub fn from_bulk_json(bytes: &[u8]) -> Result<Self> {
        let cards: Vec<BulkCard> = serde_json::from_slice(bytes)?;
        let mut db = Self::new();
        let mut skipped = 0usize;

        for card in cards {
            match descriptor_from_bulk(card) {
                Some(descriptor) => db.insert(descriptor),
                None => skipped += 1,
            }
        }

        log::info!(
            "Parsed {} card entries ({} cards without printable images skipped)",
            db.len(),
            skipped
        );
        Ok(db)
    }

    /// Load card data, preferring the parsed index next to the bulk file.
    ///
    /// When only the bulk file exists it is parsed and the index is written
    /// so later runs skip the expensive parse.
    pub async fn load(bulk_path: impl AsRef<Path>) -> Result<Self> {
        let bulk_path = bulk_path.as_ref().to_owned();
        let index_path = parsed_index_path(&bulk_path);

        if tokio::fs::try_exists(&index_path).await? {
            log::info!("Loading parsed card data from {}", index_path.display());
            let bytes = tokio::fs::read(&index_path).await?;
            let db = tokio::task::spawn_blocking(move || serde_json::from_slice::<Self>(&bytes))
                .await??;
            return Ok(db);
        }

        log::info!("Parsing bulk card data from {}", bulk_path.display());
        let bytes = tokio::fs::read(&bulk_path).await?;
        let (db, index) = tokio::task::spawn_blocking(move || {
            let db = Self::from_bulk_json(&bytes)?;
            let index = serde_json::to_vec(&db)?;
            Ok::<_, DeckError>((db, index))
        })
        .await??;

        tokio::fs::write(&index_path, index).await?;
        Ok(db)
    }
}

/// `dir/parsed_<file name>` for a bulk file at `dir/<file name>`
pub fn parsed_index_path(bulk_path: &Path) -> PathBuf {
    let file_name = bulk_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    bulk_path.with_file_name(format!("parsed_{file_name}"))
}

fn descriptor_from_bulk(card: BulkCard) -> Option<CardDescriptor> {
    let key = format!("{}-{}", card.set.to_lowercase(), card.collector_number);

    let images = match card.layout.kind() {
        LayoutKind::Unprintable => return None,
        LayoutKind::SingleFaced => CardImages::Single(card.image_uris?),
        LayoutKind::DoubleFaced => {
            let mut faces = card.card_faces?.into_iter().filter_map(|face| {
                face.image_uris.map(|image_uris| CardFace {
                    name: face.name,
                    image_uris,
                })
            });
            let (Some(a), Some(b)) = (faces.next(), faces.next()) else {
                log::warn!("{} ({key}) is missing face images", card.name);
                return None;
            };
            CardImages::Double([a, b])
        }
    };

    Some(CardDescriptor {
        key,
        name: card.name,
        layout: card.layout,
        border_color: card.border_color,
        images,
    })
}
