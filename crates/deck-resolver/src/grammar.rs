//! Decklist line grammar
//!
//! ```text
//! line      ::= copies ' ' expr | '#' comment | blank
//! expr      ::= face ( '||' face )*
//! face      ::= '*' custom_name | force? name '(' SET ')' number
//! force     ::= '!' | '!!'
//! ```

use crate::types::{DeckError, Result};

/// Face selected explicitly with `!` or `!!`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedFace {
    A,
    B,
}

impl ForcedFace {
    pub fn suffix(self) -> &'static str {
        match self {
            ForcedFace::A => "_A",
            ForcedFace::B => "_B",
        }
    }
}

/// `Name (SET) number`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRef<'a> {
    pub name: &'a str,
    pub set: &'a str,
    pub number: &'a str,
    pub forced: Option<ForcedFace>,
}

impl CardRef<'_> {
    /// Lookup key of the whole card: lowercase `set-number`
    pub fn key(&self) -> String {
        format!("{}-{}", self.set.to_lowercase(), self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaceExpr<'a> {
    Custom { name: &'a str },
    Card(CardRef<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardExpr<'a> {
    Single(FaceExpr<'a>),
    Composite(Vec<FaceExpr<'a>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckLine<'a> {
    /// 1-based line number in the decklist
    pub line: usize,
    pub copies: u32,
    pub expr: CardExpr<'a>,
}

/// Parse every meaningful line of a decklist.
pub fn parse_decklist(text: &str) -> Result<Vec<DeckLine<'_>>> {
    let mut lines = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        if let Some(line) = parse_line(idx + 1, raw)? {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// Parse one decklist line. Blank and `#` lines yield `None`.
pub fn parse_line(line: usize, raw: &str) -> Result<Option<DeckLine<'_>>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let err = |message: String| DeckError::Parse { line, message };

    let (copies_text, rest) = trimmed
        .split_once(char::is_whitespace)
        .ok_or_else(|| err(format!("expected `<copies> <card>`, got `{trimmed}`")))?;

    let copies: u32 = copies_text
        .parse()
        .map_err(|_| err(format!("invalid copy count `{copies_text}`")))?;
    if copies == 0 {
        return Err(err("copy count must be at least 1".to_string()));
    }

    let rest = rest.trim();
    let expr = if rest.contains("||") {
        let faces = rest
            .split("||")
            .map(|face| parse_face(line, face.trim()))
            .collect::<Result<Vec<_>>>()?;
        CardExpr::Composite(faces)
    } else {
        CardExpr::Single(parse_face(line, rest)?)
    };

    Ok(Some(DeckLine { line, copies, expr }))
}

fn parse_face(line: usize, text: &str) -> Result<FaceExpr<'_>> {
    let err = |message: String| DeckError::Parse { line, message };

    if let Some(name) = text.strip_prefix('*') {
        let name = name.trim();
        if name.is_empty() {
            return Err(err("custom card needs a name after `*`".to_string()));
        }
        return Ok(FaceExpr::Custom { name });
    }

    let (forced, body) = if let Some(body) = text.strip_prefix("!!") {
        (Some(ForcedFace::B), body.trim_start())
    } else if let Some(body) = text.strip_prefix('!') {
        (Some(ForcedFace::A), body.trim_start())
    } else {
        (None, text)
    };

    let malformed = || err(format!("expected `Name (SET) number`, got `{text}`"));

    let open = body.rfind('(').ok_or_else(malformed)?;
    let close = open + body[open..].find(')').ok_or_else(malformed)?;

    let name = body[..open].trim();
    let set = body[open + 1..close].trim();
    let number = body[close + 1..].trim();

    if name.is_empty()
        || set.is_empty()
        || number.is_empty()
        || set.contains(char::is_whitespace)
        || number.contains(char::is_whitespace)
    {
        return Err(malformed());
    }

    Ok(FaceExpr::Card(CardRef {
        name,
        set,
        number,
        forced,
    }))
}
