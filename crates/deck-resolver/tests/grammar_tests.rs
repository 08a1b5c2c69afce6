use deck_resolver::DeckError;
use deck_resolver::grammar::*;

#[test]
fn test_parse_normal_card() {
    let line = parse_line(1, "2 Lightning Bolt (M11) 149").unwrap().unwrap();
    assert_eq!(line.line, 1);
    assert_eq!(line.copies, 2);
    match line.expr {
        CardExpr::Single(FaceExpr::Card(card)) => {
            assert_eq!(card.name, "Lightning Bolt");
            assert_eq!(card.set, "M11");
            assert_eq!(card.number, "149");
            assert_eq!(card.forced, None);
            assert_eq!(card.key(), "m11-149");
        }
        other => panic!("unexpected expression: {other:?}"),
    }
}

#[test]
fn test_parse_forced_faces() {
    let a = parse_line(1, "1 !Delver of Secrets (ISD) 51").unwrap().unwrap();
    let b = parse_line(2, "1 !!Delver of Secrets (ISD) 51").unwrap().unwrap();

    let CardExpr::Single(FaceExpr::Card(a)) = a.expr else {
        panic!("expected card");
    };
    let CardExpr::Single(FaceExpr::Card(b)) = b.expr else {
        panic!("expected card");
    };
    assert_eq!(a.forced, Some(ForcedFace::A));
    assert_eq!(b.forced, Some(ForcedFace::B));
    assert_eq!(b.name, "Delver of Secrets");
    assert_eq!(b.key(), "isd-51");
}

#[test]
fn test_parse_custom_card() {
    let line = parse_line(4, "3 *My Token").unwrap().unwrap();
    assert_eq!(line.copies, 3);
    assert_eq!(
        line.expr,
        CardExpr::Single(FaceExpr::Custom { name: "My Token" })
    );
}

#[test]
fn test_parse_composite() {
    let line = parse_line(1, "1 *Front Art || Lightning Bolt (M11) 149")
        .unwrap()
        .unwrap();
    let CardExpr::Composite(faces) = line.expr else {
        panic!("expected composite");
    };
    assert_eq!(faces.len(), 2);
    assert_eq!(faces[0], FaceExpr::Custom { name: "Front Art" });
    assert!(matches!(faces[1], FaceExpr::Card(ref card) if card.set == "M11"));
}

#[test]
fn test_name_with_parentheses() {
    let line = parse_line(1, "1 Who (What) (UST) 7").unwrap().unwrap();
    let CardExpr::Single(FaceExpr::Card(card)) = line.expr else {
        panic!("expected card");
    };
    assert_eq!(card.name, "Who (What)");
    assert_eq!(card.key(), "ust-7");
}

#[test]
fn test_blank_and_comment_lines_are_skipped() {
    assert!(parse_line(1, "").unwrap().is_none());
    assert!(parse_line(2, "   ").unwrap().is_none());
    assert!(parse_line(3, "# sideboard").unwrap().is_none());

    let lines = parse_decklist("# deck\n\n1 Lightning Bolt (M11) 149\n").unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line, 3);
}

#[test]
fn test_invalid_lines_report_line_number() {
    for (text, expected_line) in [
        ("x Lightning Bolt (M11) 149", 5),
        ("0 Lightning Bolt (M11) 149", 5),
        ("1 Lightning Bolt M11 149", 5),
        ("1", 5),
        ("1 *", 5),
        ("1 Lightning Bolt (M11)", 5),
    ] {
        match parse_line(expected_line, text) {
            Err(DeckError::Parse { line, .. }) => assert_eq!(line, expected_line, "{text}"),
            other => panic!("expected parse error for `{text}`, got {other:?}"),
        }
    }
}
