use card_sheets::*;
use deck_resolver::Face::{Back as B, Front as F};
use lopdf::{Dictionary, Document, Object, Stream};
use std::collections::BTreeMap;

/// Single-page document whose content stream names the page.
fn create_test_pdf(label: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        format!("% {label}\nq Q").into_bytes(),
    ));
    let page_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
    ]));

    // MediaBox and Resources live on the page tree and must be inherited
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        ("Count", Object::Integer(1)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ]),
        ),
        ("Resources", Object::Dictionary(Dictionary::new())),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn rendered(total_pages: usize, two_sided: bool) -> RenderedPages {
    let mut pages = BTreeMap::new();
    for page in 0..total_pages {
        pages.insert((page, F), create_test_pdf(&format!("F{page}")));
        if two_sided {
            pages.insert((page, B), create_test_pdf(&format!("B{page}")));
        }
    }
    RenderedPages { total_pages, pages }
}

fn labels(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|&id| {
            let content = doc.get_page_content(id).unwrap();
            let text = String::from_utf8(content).unwrap();
            text.lines()
                .next()
                .unwrap()
                .trim_start_matches("% ")
                .to_string()
        })
        .collect()
}

#[test]
fn test_pattern_from_flags() {
    assert_eq!(PairingPattern::from_flags(false, false), PairingPattern::SingleSided);
    assert_eq!(PairingPattern::from_flags(false, true), PairingPattern::SingleSided);
    assert_eq!(PairingPattern::from_flags(true, false), PairingPattern::TwoSided);
    assert_eq!(
        PairingPattern::from_flags(true, true),
        PairingPattern::TwoSidedStaggered
    );
}

#[test]
fn test_staggered_order() {
    assert_eq!(
        page_order(4, PairingPattern::TwoSidedStaggered),
        vec![(0, F), (1, F), (0, B), (1, B), (2, F), (3, F), (2, B), (3, B)]
    );
}

#[test]
fn test_odd_page_count_omits_missing_partner() {
    assert_eq!(
        page_order(3, PairingPattern::TwoSidedStaggered),
        vec![(0, F), (1, F), (0, B), (1, B), (2, F), (2, B)]
    );
    assert_eq!(
        page_order(3, PairingPattern::TwoSided),
        vec![(0, F), (0, B), (1, F), (1, B), (2, F), (2, B)]
    );
    assert_eq!(
        page_order(3, PairingPattern::SingleSided),
        vec![(0, F), (1, F), (2, F)]
    );
    assert!(page_order(0, PairingPattern::TwoSided).is_empty());
}

#[test]
fn test_merge_follows_pattern() {
    let merged = merge_pages(&rendered(3, true), PairingPattern::TwoSidedStaggered).unwrap();
    assert_eq!(labels(&merged), vec!["F0", "F1", "B0", "B1", "F2", "B2"]);

    let merged = merge_pages(&rendered(2, true), PairingPattern::TwoSided).unwrap();
    assert_eq!(labels(&merged), vec!["F0", "B0", "F1", "B1"]);

    let merged = merge_pages(&rendered(3, false), PairingPattern::SingleSided).unwrap();
    assert_eq!(labels(&merged), vec!["F0", "F1", "F2"]);
}

#[test]
fn test_merged_pages_keep_inherited_media_box() {
    let merged = merge_pages(&rendered(1, false), PairingPattern::SingleSided).unwrap();
    let page_id = *merged.get_pages().values().next().unwrap();
    let page = merged.get_dictionary(page_id).unwrap();

    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    assert_eq!(media_box[2].as_i64().unwrap(), 595);
    assert!(page.has(b"Resources"));
}

#[test]
fn test_missing_back_page_is_an_error() {
    match merge_pages(&rendered(2, false), PairingPattern::TwoSided) {
        Err(SheetError::MissingPage { page, face }) => {
            assert_eq!(page, 0);
            assert_eq!(face, B);
        }
        other => panic!("expected missing page, got {other:?}"),
    }
}

#[test]
fn test_merge_without_pages() {
    assert!(matches!(
        merge_pages(&RenderedPages::default(), PairingPattern::SingleSided),
        Err(SheetError::NoPages)
    ));
}

#[tokio::test]
async fn test_save_pdf_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output").join("deck.pdf");

    let merged = merge_pages(&rendered(2, true), PairingPattern::TwoSided).unwrap();
    save_pdf(merged, &path).await.unwrap();

    let loaded = Document::load(&path).unwrap();
    assert_eq!(labels(&loaded), vec!["F0", "B0", "F1", "B1"]);
}
