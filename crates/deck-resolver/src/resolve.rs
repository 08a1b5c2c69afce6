//! Decklist resolution: decklist text → ordered print units
//!
//! Every line is resolved to one or more template units, and each template
//! is repeated `copies` times in decklist order. Any failing line aborts the
//! whole resolution.

use crate::grammar::{CardExpr, CardRef, DeckLine, FaceExpr, parse_decklist};
use crate::provider::CardDataProvider;
use crate::types::*;
use std::path::Path;

/// A resolved face expression before print-mode expansion
enum ResolvedFace {
    Single(Side),
    TwoFaced([Side; 2]),
}

/// Resolve a decklist into print units.
pub fn resolve_decklist<P>(
    text: &str,
    provider: &P,
    options: &ResolveOptions,
) -> Result<Vec<PrintUnit>>
where
    P: CardDataProvider + ?Sized,
{
    let mut units = Vec::new();

    for line in parse_decklist(text)? {
        let templates = resolve_line(&line, provider, options)?;
        for _ in 0..line.copies {
            units.extend(templates.iter().cloned());
        }
    }

    Ok(units)
}

/// Read and resolve a decklist file.
pub async fn load_decklist<P>(
    path: impl AsRef<Path>,
    provider: &P,
    options: &ResolveOptions,
) -> Result<Vec<PrintUnit>>
where
    P: CardDataProvider + ?Sized,
{
    let text = tokio::fs::read_to_string(path.as_ref()).await?;
    resolve_decklist(&text, provider, options)
}

/// Resolve one line into the units printed for a single copy.
fn resolve_line<P>(line: &DeckLine<'_>, provider: &P, options: &ResolveOptions) -> Result<Vec<PrintUnit>>
where
    P: CardDataProvider + ?Sized,
{
    match &line.expr {
        CardExpr::Composite(faces) => {
            if faces.len() != 2 {
                return Err(DeckError::Composite {
                    line: line.line,
                    faces: faces.len(),
                });
            }
            let sides = faces
                .iter()
                .map(|face| {
                    resolve_face(line.line, face, provider, options).map(|resolved| match resolved {
                        ResolvedFace::Single(side) => side,
                        // A two-faced card inside a composite contributes its front face
                        ResolvedFace::TwoFaced([front, _]) => front,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(vec![PrintUnit {
                sides,
                composite: true,
            }])
        }
        CardExpr::Single(face) => {
            let resolved = resolve_face(line.line, face, provider, options)?;
            Ok(expand(resolved, options))
        }
    }
}

/// Apply the print-mode decision table.
fn expand(face: ResolvedFace, options: &ResolveOptions) -> Vec<PrintUnit> {
    let mode = options.mode;
    let with_backside = mode.two_sided && mode.custom_backside;

    match face {
        ResolvedFace::TwoFaced([a, b]) => {
            if mode.split_double_faced && !mode.two_sided {
                vec![PrintUnit::single(a), PrintUnit::single(b)]
            } else if with_backside {
                let back = Side::backside(&options.backside);
                vec![
                    PrintUnit::double(a, back.clone()),
                    PrintUnit::double(b, back),
                ]
            } else if mode.two_sided {
                vec![PrintUnit::double(a, b)]
            } else {
                vec![PrintUnit::single(a)]
            }
        }
        ResolvedFace::Single(side) => {
            if with_backside {
                vec![PrintUnit::double(side, Side::backside(&options.backside))]
            } else {
                vec![PrintUnit::single(side)]
            }
        }
    }
}

fn resolve_face<P>(
    line: usize,
    face: &FaceExpr<'_>,
    provider: &P,
    options: &ResolveOptions,
) -> Result<ResolvedFace>
where
    P: CardDataProvider + ?Sized,
{
    match face {
        FaceExpr::Custom { name } => Ok(ResolvedFace::Single(Side::custom(name))),
        FaceExpr::Card(card) => resolve_card(line, card, provider, options),
    }
}

fn resolve_card<P>(
    line: usize,
    card: &CardRef<'_>,
    provider: &P,
    options: &ResolveOptions,
) -> Result<ResolvedFace>
where
    P: CardDataProvider + ?Sized,
{
    let key = card.key();
    let lookup = |key: &str| {
        provider.lookup(key).map_err(|e| DeckError::Lookup {
            line,
            key: e.key,
        })
    };
    let descriptor = lookup(&key)?;

    match (&descriptor.images, card.forced) {
        (CardImages::Single(uris), _) => {
            // Forcing a face of a single-faced card prints the card itself
            let side = remote_side(line, card.name, &key, uris, descriptor, options)?;
            Ok(ResolvedFace::Single(side))
        }
        (CardImages::Double(_), Some(forced)) => {
            let face_key = format!("{key}{}", forced.suffix());
            let face = lookup(&face_key)?;
            let CardImages::Single(uris) = &face.images else {
                return Err(DeckError::CardData(format!(
                    "face entry `{face_key}` has more than one image"
                )));
            };
            let side = remote_side(line, &face.name, &face_key, uris, descriptor, options)?;
            Ok(ResolvedFace::Single(side))
        }
        (CardImages::Double([a, b]), None) => {
            let front_key = format!("{key}_A");
            let back_key = format!("{key}_B");
            let front = remote_side(line, &a.name, &front_key, &a.image_uris, descriptor, options)?;
            let back = remote_side(line, &b.name, &back_key, &b.image_uris, descriptor, options)?;
            Ok(ResolvedFace::TwoFaced([front, back]))
        }
    }
}

fn remote_side(
    line: usize,
    name: &str,
    key: &str,
    uris: &ImageUris,
    descriptor: &CardDescriptor,
    options: &ResolveOptions,
) -> Result<Side> {
    let url = uris
        .get(options.image_type)
        .ok_or_else(|| DeckError::MissingImage {
            line,
            key: key.to_string(),
            image_type: options.image_type,
        })?;

    Ok(Side {
        name: name.to_string(),
        key: key.to_string(),
        source: ImageSource::Remote {
            url: url.to_string(),
        },
        black_border: descriptor.is_black_bordered(),
    })
}
