//! `<<name>>` placeholder parsing and substitution.
//!
//! Column names are matched literally and case-sensitively; no pattern
//! syntax is involved, so names containing regex metacharacters substitute
//! like any other. A name that itself contains `<<` or `>>` cannot be written
//! as a token and is never matched by [`substitute`].

use crate::engine::ports::{ContentDocument, ContentSurface};
use common::model::row::RowRecord;

pub const OPEN: &str = "<<";
pub const CLOSE: &str = ">>";

/// A piece of a tokenized template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// The name between the delimiters.
    Token(&'a str),
}

/// Render a column name as a token.
pub fn token(name: &str) -> String {
    format!("{}{}{}", OPEN, name, CLOSE)
}

/// Split `template` into literal text and tokens.
///
/// Each `>>` closes the nearest preceding `<<`, so `<<<a>>` yields the
/// literal `<` followed by the token `a`.
pub fn tokenize(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(close) = rest.find(CLOSE) {
        let head = &rest[..close];
        match head.rfind(OPEN) {
            Some(open) => {
                if open > 0 {
                    segments.push(Segment::Literal(&head[..open]));
                }
                segments.push(Segment::Token(&head[open + OPEN.len()..]));
            }
            None => segments.push(Segment::Literal(&rest[..close + CLOSE.len()])),
        }
        rest = &rest[close + CLOSE.len()..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    segments
}

/// Replace every token naming a column of `row` with the stringified cell
/// value. Tokens for unknown columns are left in place.
///
/// Substituted values are not scanned again, so a value that happens to
/// contain a token is inserted verbatim.
pub fn substitute(template: &str, row: &RowRecord) -> String {
    let mut out = String::with_capacity(template.len());
    for segment in tokenize(template) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Token(name) => match row.get(name) {
                Some(value) => out.push_str(&value.to_string()),
                None => {
                    out.push_str(OPEN);
                    out.push_str(name);
                    out.push_str(CLOSE);
                }
            },
        }
    }
    out
}

/// Apply `row` to every content surface of `document` in place.
///
/// Each surface is filled with [`substitute`] in one pass, so a value that
/// looks like a token stays literal here too. Running it again with the same row changes nothing once all tokens are
/// gone. The document must not be shared while this runs.
pub fn substitute_in_document<D: ContentDocument>(document: &mut D, row: &RowRecord) {
    for surface in document.content_surfaces_mut() {
        let current = surface.text().to_string();
        let filled = substitute(&current, row);
        if filled != current {
            surface.replace_all_occurrences(&current, &filled);
        }
    }
}

/// Owned form of [`substitute_in_document`].
pub fn apply_template<D: ContentDocument>(mut document: D, row: &RowRecord) -> D {
    substitute_in_document(&mut document, row);
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::document::Presentation;
    use common::model::cell::CellValue;

    fn row(pairs: &[(&str, CellValue)]) -> RowRecord {
        let mut record = RowRecord::new(1);
        for (k, v) in pairs {
            record.insert(*k, v.clone());
        }
        record
    }

    #[test]
    fn tokenize_separates_literals_and_tokens() {
        assert_eq!(
            tokenize("Hi <<Name>>, see <<Link>>."),
            vec![
                Segment::Literal("Hi "),
                Segment::Token("Name"),
                Segment::Literal(", see "),
                Segment::Token("Link"),
                Segment::Literal("."),
            ]
        );
    }

    #[test]
    fn tokenize_handles_stray_delimiters() {
        assert_eq!(
            tokenize("a >> b <<<x>>"),
            vec![
                Segment::Literal("a >>"),
                Segment::Literal(" b <"),
                Segment::Token("x"),
            ]
        );
        assert_eq!(tokenize("<<open only"), vec![Segment::Literal("<<open only")]);
    }

    #[test]
    fn substitute_replaces_known_and_keeps_unknown() {
        let r = row(&[("Name", "Ann".into()), ("Score", CellValue::Number(9.5))]);
        assert_eq!(
            substitute("<<Name>> got <<Score>> (<<Rank>>)", &r),
            "Ann got 9.5 (<<Rank>>)"
        );
    }

    #[test]
    fn substitute_replaces_every_occurrence() {
        let r = row(&[("x", "1".into())]);
        assert_eq!(substitute("<<x>><<x>> <<x>>", &r), "11 1");
    }

    #[test]
    fn substitute_is_case_sensitive() {
        let r = row(&[("name", "ann".into())]);
        assert_eq!(substitute("<<Name>>", &r), "<<Name>>");
    }

    #[test]
    fn empty_cells_become_empty_text() {
        let r = row(&[("Note", CellValue::Empty)]);
        assert_eq!(substitute("[<<Note>>]", &r), "[]");
    }

    #[test]
    fn metacharacter_column_names_match_literally() {
        let r = row(&[("Price ($)", CellValue::Number(12.0)), ("a.b*", "ok".into())]);
        assert_eq!(substitute("<<Price ($)>> <<a.b*>> <<aXb*>>", &r), "12 ok <<aXb*>>");
    }

    #[test]
    fn values_are_not_rescanned() {
        let r = row(&[("A", "<<B>>".into()), ("B", "b".into())]);
        assert_eq!(substitute("<<A>>", &r), "<<B>>");
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let r = row(&[("Name", "Ann".into()), ("City", "Oslo".into())]);
        let template = "<<Name>> from <<City>>, <<Unknown>>";
        let once = substitute(template, &r);
        assert_eq!(substitute(&once, &r), once);
    }

    #[test]
    fn no_known_token_survives() {
        let r = row(&[("k", "v".into()), ("m", CellValue::Bool(true))]);
        let templates = ["<<k>>", "x<<k>>y<<m>>z", "<<<k>>>", "<<k<<k>>>>", "<<z>><<k>>"];
        for t in templates {
            let out = substitute(t, &r);
            assert!(!out.contains("<<k>>"), "{t:?} -> {out:?}");
            assert!(!out.contains("<<m>>"), "{t:?} -> {out:?}");
        }
    }

    #[test]
    fn document_substitution_touches_every_slide() {
        let r = row(&[("Name", "Bo".into())]);
        let mut deck = Presentation::parse("Dear <<Name>>\n---\nBye <<Name>> <<Other>>");
        substitute_in_document(&mut deck, &r);
        assert_eq!(deck.slides[0].text, "Dear Bo");
        assert_eq!(deck.slides[1].text, "Bye Bo <<Other>>");

        let again = apply_template(deck.clone(), &r);
        assert_eq!(again, deck);
    }

    #[test]
    fn token_shaped_values_stay_literal_in_documents() {
        let r = row(&[("A", "<<B>>".into()), ("B", "b".into())]);
        let first = format!("{} and {}", token("A"), token("B"));
        let mut deck = Presentation::parse(&format!("{}\n---\n{}", first, token("A")));
        substitute_in_document(&mut deck, &r);

        assert_eq!(deck.slides[0].text, substitute(&first, &r));
        assert_eq!(deck.slides[0].text, "<<B>> and b");
        assert_eq!(deck.slides[1].text, "<<B>>");
    }
}
