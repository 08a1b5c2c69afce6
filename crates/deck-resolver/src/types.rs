use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: card `{key}` not found in card data")]
    Lookup { line: usize, key: String },
    #[error("line {line}: composite card needs exactly 2 faces, found {faces}")]
    Composite { line: usize, faces: usize },
    #[error("line {line}: card `{key}` has no `{image_type}` image")]
    MissingImage {
        line: usize,
        key: String,
        image_type: ImageType,
    },
    #[error("Card data error: {0}")]
    CardData(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, DeckError>;

/// Returned by a [`CardDataProvider`](crate::CardDataProvider) for an unknown key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("card `{key}` not found in card data")]
pub struct LookupError {
    pub key: String,
}

/// Card layouts as reported by the card data source.
///
/// Adding a layout here forces every match on it to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardLayout {
    Normal,
    Split,
    Flip,
    Transform,
    ModalDfc,
    Meld,
    Leveler,
    Class,
    Case,
    Saga,
    Adventure,
    Mutate,
    Prototype,
    Battle,
    Planar,
    Phenomenon,
    Scheme,
    Vanguard,
    Token,
    DoubleFacedToken,
    Emblem,
    Augment,
    Host,
    ArtSeries,
    ReversibleCard,
}

/// How a layout is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// One image for the whole card
    SingleFaced,
    /// One image per face, two faces
    DoubleFaced,
    /// Not a printable card
    Unprintable,
}

impl CardLayout {
    pub fn kind(self) -> LayoutKind {
        match self {
            CardLayout::Transform
            | CardLayout::ModalDfc
            | CardLayout::DoubleFacedToken
            | CardLayout::Battle
            | CardLayout::ReversibleCard => LayoutKind::DoubleFaced,
            CardLayout::Normal
            | CardLayout::Split
            | CardLayout::Flip
            | CardLayout::Meld
            | CardLayout::Leveler
            | CardLayout::Class
            | CardLayout::Case
            | CardLayout::Saga
            | CardLayout::Adventure
            | CardLayout::Mutate
            | CardLayout::Prototype
            | CardLayout::Planar
            | CardLayout::Phenomenon
            | CardLayout::Scheme
            | CardLayout::Vanguard
            | CardLayout::Token
            | CardLayout::Emblem
            | CardLayout::Augment
            | CardLayout::Host => LayoutKind::SingleFaced,
            CardLayout::ArtSeries => LayoutKind::Unprintable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderColor {
    Black,
    White,
    Borderless,
    Silver,
    Gold,
    Yellow,
}

/// Image variants offered per card face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    Small,
    Normal,
    Large,
    #[default]
    Png,
    ArtCrop,
    BorderCrop,
}

impl ImageType {
    pub fn name(self) -> &'static str {
        match self {
            ImageType::Small => "small",
            ImageType::Normal => "normal",
            ImageType::Large => "large",
            ImageType::Png => "png",
            ImageType::ArtCrop => "art_crop",
            ImageType::BorderCrop => "border_crop",
        }
    }

    /// File extension of the downloaded image
    pub fn extension(self) -> &'static str {
        match self {
            ImageType::Png => "png",
            ImageType::Small
            | ImageType::Normal
            | ImageType::Large
            | ImageType::ArtCrop
            | ImageType::BorderCrop => "jpg",
        }
    }

    pub fn all() -> [ImageType; 6] {
        [
            ImageType::Small,
            ImageType::Normal,
            ImageType::Large,
            ImageType::Png,
            ImageType::ArtCrop,
            ImageType::BorderCrop,
        ]
    }
}

impl std::fmt::Display for ImageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUris {
    pub small: Option<String>,
    pub normal: Option<String>,
    pub large: Option<String>,
    pub png: Option<String>,
    pub art_crop: Option<String>,
    pub border_crop: Option<String>,
}

impl ImageUris {
    pub fn get(&self, image_type: ImageType) -> Option<&str> {
        let uri = match image_type {
            ImageType::Small => &self.small,
            ImageType::Normal => &self.normal,
            ImageType::Large => &self.large,
            ImageType::Png => &self.png,
            ImageType::ArtCrop => &self.art_crop,
            ImageType::BorderCrop => &self.border_crop,
        };
        uri.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFace {
    pub name: String,
    pub image_uris: ImageUris,
}

/// Image references of a card: one set for single-faced cards, one per face otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardImages {
    Single(ImageUris),
    Double([CardFace; 2]),
}

/// Read-only card metadata as produced by the card data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDescriptor {
    pub key: String,
    pub name: String,
    pub layout: CardLayout,
    pub border_color: BorderColor,
    pub images: CardImages,
}

impl CardDescriptor {
    pub fn is_black_bordered(&self) -> bool {
        self.border_color == BorderColor::Black
    }
}

/// Where the art of a [`Side`] comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// Downloaded from the card data source
    Remote { url: String },
    /// User-supplied art in the custom cards directory
    CustomCard { name: String },
    /// Shared backside art in the card backs directory
    Backside { file: String },
}

/// A single printable face with a unique cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Side {
    pub name: String,
    pub key: String,
    pub source: ImageSource,
    pub black_border: bool,
}

/// Cache key shared by every custom backside.
pub const BACKSIDE_KEY: &str = "back";

impl Side {
    pub fn custom(name: &str) -> Self {
        Self {
            name: name.to_string(),
            key: format!("*{name}"),
            source: ImageSource::CustomCard {
                name: name.to_string(),
            },
            black_border: false,
        }
    }

    pub fn backside(file: &str) -> Self {
        Self {
            name: BACKSIDE_KEY.to_string(),
            key: BACKSIDE_KEY.to_string(),
            source: ImageSource::Backside {
                file: file.to_string(),
            },
            black_border: false,
        }
    }

    pub fn is_custom(&self) -> bool {
        !matches!(self.source, ImageSource::Remote { .. })
    }
}

/// Which side of the printed sheet is being produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    Front,
    Back,
}

impl Face {
    pub fn index(self) -> usize {
        match self {
            Face::Front => 0,
            Face::Back => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Face::Front => "front",
            Face::Back => "back",
        }
    }
}

/// One physical card copy: a front side and an optional back side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintUnit {
    pub sides: Vec<Side>,
    pub composite: bool,
}

impl PrintUnit {
    pub fn single(side: Side) -> Self {
        Self {
            sides: vec![side],
            composite: false,
        }
    }

    pub fn double(front: Side, back: Side) -> Self {
        Self {
            sides: vec![front, back],
            composite: false,
        }
    }

    pub fn front(&self) -> &Side {
        &self.sides[0]
    }

    pub fn back(&self) -> Option<&Side> {
        self.sides.get(1)
    }

    pub fn side(&self, face: Face) -> Option<&Side> {
        self.sides.get(face.index())
    }
}

/// Printing-mode flags, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrintMode {
    pub two_sided: bool,
    pub split_double_faced: bool,
    pub custom_backside: bool,
}

/// Everything the resolver needs besides the decklist and card data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    pub mode: PrintMode,
    pub image_type: ImageType,
    /// File name of the custom backside inside the card backs directory
    pub backside: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            mode: PrintMode::default(),
            image_type: ImageType::Png,
            backside: "back.png".to_string(),
        }
    }
}
