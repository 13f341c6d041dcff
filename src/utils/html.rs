// src/utils/html.rs

//! Rendered-text extraction from parsed HTML.

use scraper::{ElementRef, Node};

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "footer", "form", "h1",
    "h2", "h3", "h4", "h5", "h6", "header", "li", "main", "nav", "ol", "p", "pre", "section",
    "table", "tr", "ul",
];

/// Text of an element as a browser would render it.
///
/// Source whitespace collapses to single spaces, `<br>` and block boundaries
/// become line breaks, and `&nbsp;` survives as U+00A0.
pub fn inner_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    render(element, &mut out);
    out.lines()
        .map(|line| line.trim_matches(' '))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

fn render(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            match name {
                "br" => out.push('\n'),
                "script" | "style" => {}
                _ if BLOCK_ELEMENTS.contains(&name) => {
                    break_line(out);
                    render(child_element, out);
                    break_line(out);
                }
                _ => render(child_element, out),
            }
        } else if let Node::Text(text) = child.value() {
            push_collapsed(out, text);
        }
    }
}

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    for c in text.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{c}') {
            if !out.is_empty() && !out.ends_with([' ', '\n']) {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}
