//! Page pairing and merging
//!
//! Rendered single-page documents are appended into one output document in
//! the order the printer needs for the chosen duplex mode.

use crate::compose::RenderedPages;
use crate::types::*;
use deck_resolver::Face;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::time::Instant;

/// Page order for the output document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingPattern {
    /// `F0 F1 F2 ...`
    SingleSided,
    /// `F0 B0 F1 B1 ...`
    TwoSided,
    /// `F0 F1 B0 B1 F2 F3 B2 B3 ...`
    TwoSidedStaggered,
}

impl PairingPattern {
    pub fn from_flags(two_sided: bool, stagger: bool) -> Self {
        match (two_sided, stagger) {
            (false, _) => PairingPattern::SingleSided,
            (true, false) => PairingPattern::TwoSided,
            (true, true) => PairingPattern::TwoSidedStaggered,
        }
    }

    /// Offsets applied to every pair of page indices
    fn offsets(self) -> &'static [(usize, Face)] {
        match self {
            PairingPattern::SingleSided => &[(0, Face::Front), (1, Face::Front)],
            PairingPattern::TwoSided => &[
                (0, Face::Front),
                (0, Face::Back),
                (1, Face::Front),
                (1, Face::Back),
            ],
            PairingPattern::TwoSidedStaggered => &[
                (0, Face::Front),
                (1, Face::Front),
                (0, Face::Back),
                (1, Face::Back),
            ],
        }
    }
}

/// Output sequence of `(page index, face)`. Indices past the last page are
/// left out.
pub fn page_order(total_pages: usize, pattern: PairingPattern) -> Vec<(usize, Face)> {
    (0..total_pages)
        .step_by(2)
        .flat_map(|base| {
            pattern
                .offsets()
                .iter()
                .map(move |&(offset, face)| (base + offset, face))
        })
        .filter(|&(page, _)| page < total_pages)
        .collect()
}

/// Merge rendered pages into one document in pattern order.
pub fn merge_pages(rendered: &RenderedPages, pattern: PairingPattern) -> Result<Document> {
    let started = Instant::now();
    let order = page_order(rendered.total_pages, pattern);
    if order.is_empty() {
        return Err(SheetError::NoPages);
    }

    let mut output = Document::with_version("1.7");
    let pages_id = output.new_object_id();
    let mut kids = Vec::with_capacity(order.len());

    for (page, face) in order {
        let bytes = rendered
            .get(page, face)
            .ok_or(SheetError::MissingPage { page, face })?;
        let source = Document::load_mem(bytes)?;
        let source_page = source
            .get_pages()
            .values()
            .next()
            .copied()
            .ok_or(SheetError::EmptyPage { page, face })?;
        let page_id = copy_page(&mut output, &source, source_page, pages_id)?;
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len();
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count as i64)),
    ]);
    output
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    output.trailer.set("Root", catalog_id);

    log::info!("Merged {count} pages in {:.2?}", started.elapsed());
    Ok(output)
}

/// Attributes a page may inherit from its page tree ancestors
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Copy one page under `parent`, resolving inherited attributes.
fn copy_page(
    output: &mut Document,
    source: &Document,
    page_id: ObjectId,
    parent: ObjectId,
) -> Result<ObjectId> {
    let page = source.get_dictionary(page_id)?;
    let mut cache = HashMap::new();
    let mut copied = Dictionary::new();

    for (key, value) in page.iter() {
        if key.as_slice() == b"Parent" {
            continue;
        }
        copied.set(key.clone(), copy_object_deep(output, source, value, &mut cache)?);
    }

    for key in INHERITABLE {
        if copied.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(source, page, key) {
            copied.set(key.to_vec(), copy_object_deep(output, source, value, &mut cache)?);
        }
    }

    copied.set("Parent", Object::Reference(parent));
    Ok(output.add_object(copied))
}

fn inherited_attribute<'a>(
    source: &'a Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page;
    // Bounded walk in case of a cyclic page tree
    for _ in 0..32 {
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = source.get_dictionary(parent_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
    }
    None
}

/// Deep copy an object from source to output document, following references.
///
/// Uses a cache to avoid copying the same object multiple times.
pub fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            // Reserve the id first so self references terminate
            let new_id = output.new_object_id();
            cache.insert(*id, new_id);
            let referenced = source.get_object(*id)?;
            let copied = copy_object_deep(output, source, referenced, cache)?;
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in dict.iter() {
                new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(arr) => {
            let new_arr: Result<Vec<_>> = arr
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect();
            Ok(Object::Array(new_arr?))
        }
        Object::Stream(stream) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in stream.dict.iter() {
                new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
            }
            Ok(Object::Stream(Stream {
                dict: new_dict,
                content: stream.content.clone(),
                allows_compression: stream.allows_compression,
                start_position: None,
            }))
        }
        _ => Ok(obj.clone()),
    }
}
