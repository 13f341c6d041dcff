// src/services/metadata.rs

//! Labeled metadata field parsing for a novel's info panel.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::NovelMetadata;

/// Text after the first full-width colon.
static LABELED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^：]*：(?P<value>.*)$").expect("valid regex"));

/// Update time and word count share one label and are read together.
static UPDATE_AND_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<updated>\d{4}-\d{2}-\d{2} \d{2}:\d{2}).*共(?P<words>\d+万)字")
        .expect("valid regex")
});

/// Kind of a labeled field, decided by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Author,
    LatestChapter,
    UpdateTime,
}

impl LabelKind {
    pub fn classify(text: &str) -> Option<Self> {
        if text.starts_with("作者") {
            Some(Self::Author)
        } else if text.starts_with("最新") {
            Some(Self::LatestChapter)
        } else if text.starts_with("更新时间") {
            Some(Self::UpdateTime)
        } else {
            None
        }
    }
}

fn labeled_value(text: &str) -> String {
    LABELED_VALUE
        .captures(text)
        .and_then(|caps| caps.name("value"))
        .map_or(text, |m| m.as_str())
        .trim()
        .to_string()
}

/// Apply one labeled field to the metadata being collected.
pub fn apply_field(metadata: &mut NovelMetadata, field: &str) {
    let field = field.trim();
    match LabelKind::classify(field) {
        Some(LabelKind::Author) => metadata.author = Some(labeled_value(field)),
        Some(LabelKind::LatestChapter) => {
            metadata.latest_chapter_title = Some(labeled_value(field));
        }
        Some(LabelKind::UpdateTime) => {
            if let Some(caps) = UPDATE_AND_WORDS.captures(field) {
                metadata.latest_update_time = Some(caps["updated"].to_string());
                metadata.word_count = Some(caps["words"].to_string());
            } else {
                log::debug!("Update field without time and word count: {}", field);
            }
        }
        None => {}
    }
}

/// Build metadata from the heading and the labeled fields of an info panel.
pub fn parse_metadata<'a>(
    name: &str,
    fields: impl IntoIterator<Item = &'a str>,
) -> NovelMetadata {
    let mut metadata = NovelMetadata {
        name: name.trim().to_string(),
        ..NovelMetadata::default()
    };
    for field in fields {
        apply_field(&mut metadata, field);
    }
    metadata
}
