//! Renders the constrained plain-text markup used in spring descriptions
//! into structured display nodes. Paragraphs are separated by blank lines;
//! `**text**` alone in a paragraph is a heading, inline `**text**` is an
//! emphasized span. Nothing else is interpreted.

use serde::Serialize;

const MARKER: &str = "**";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Heading { text: String },
    Paragraph { spans: Vec<Span> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Span {
    Text { text: String },
    Strong { text: String },
}

/// Render markup into blocks. Absent or empty content renders nothing.
pub fn render(content: Option<&str>) -> Vec<Block> {
    let Some(content) = content else {
        return Vec::new();
    };
    content
        .split("\n\n")
        .map(|unit| unit.trim_matches('\n'))
        .filter(|unit| !unit.is_empty())
        .map(render_unit)
        .collect()
}

fn render_unit(unit: &str) -> Block {
    // A paragraph that starts and ends with the bold marker is a heading.
    if let Some(inner) = unit
        .strip_prefix(MARKER)
        .and_then(|rest| rest.strip_suffix(MARKER))
    {
        return Block::Heading {
            text: inner.to_string(),
        };
    }
    Block::Paragraph {
        spans: render_spans(unit),
    }
}

fn render_spans(unit: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = unit;
    loop {
        let emphasized = rest.find(MARKER).and_then(|open| {
            let after = &rest[open + MARKER.len()..];
            after.find(MARKER).map(|close| (open, close))
        });
        let Some((open, close)) = emphasized else {
            // No complete span left; whatever remains is literal text,
            // including any unmatched marker.
            if !rest.is_empty() {
                spans.push(Span::Text {
                    text: rest.to_string(),
                });
            }
            break;
        };
        if open > 0 {
            spans.push(Span::Text {
                text: rest[..open].to_string(),
            });
        }
        let inner_start = open + MARKER.len();
        spans.push(Span::Strong {
            text: rest[inner_start..inner_start + close].to_string(),
        });
        rest = &rest[inner_start + close + MARKER.len()..];
    }
    spans
}
