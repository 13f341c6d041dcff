// src/models/selectors.rs

//! CSS selectors for the catalog site's markup.

use serde::{Deserialize, Serialize};

/// Selectors used on the home page, search results and novel index page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSelectors {
    /// Search text input on the home page
    #[serde(default = "defaults::search_input")]
    pub search_input: String,

    /// Submit control of the search form
    #[serde(default = "defaults::search_submit")]
    pub search_submit: String,

    /// Metadata panel of a single novel
    #[serde(default = "defaults::info_panel")]
    pub info_panel: String,

    /// Novel title inside the metadata panel
    #[serde(default = "defaults::info_heading")]
    pub info_heading: String,

    /// Labeled fields inside the metadata panel
    #[serde(default = "defaults::info_fields")]
    pub info_fields: String,

    /// Listing shown when a search matches several novels
    #[serde(default = "defaults::candidate_list")]
    pub candidate_list: String,

    /// Chapter anchors after the marker that ends the "recently updated" list
    #[serde(default = "defaults::chapter_links")]
    pub chapter_links: String,
}

impl Default for CatalogSelectors {
    fn default() -> Self {
        Self {
            search_input: defaults::search_input(),
            search_submit: defaults::search_submit(),
            info_panel: defaults::info_panel(),
            info_heading: defaults::info_heading(),
            info_fields: defaults::info_fields(),
            candidate_list: defaults::candidate_list(),
            chapter_links: defaults::chapter_links(),
        }
    }
}

impl CatalogSelectors {
    pub fn all(&self) -> [&str; 7] {
        [
            &self.search_input,
            &self.search_submit,
            &self.info_panel,
            &self.info_heading,
            &self.info_fields,
            &self.candidate_list,
            &self.chapter_links,
        ]
    }
}

/// Selectors and boilerplate used on a chapter page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterSelectors {
    #[serde(default = "defaults::chapter_title")]
    pub title: String,

    #[serde(default = "defaults::chapter_content")]
    pub content: String,

    /// Advertising line embedded in chapter text; `{name}` is the novel name
    #[serde(default = "defaults::watermark")]
    pub watermark: String,
}

impl Default for ChapterSelectors {
    fn default() -> Self {
        Self {
            title: defaults::chapter_title(),
            content: defaults::chapter_content(),
            watermark: defaults::watermark(),
        }
    }
}

impl ChapterSelectors {
    /// Watermark text for a specific novel.
    pub fn watermark_for(&self, novel_name: &str) -> String {
        self.watermark.replace("{name}", novel_name)
    }
}

mod defaults {
    pub fn search_input() -> String {
        "form > input[name='searchkey']".into()
    }
    pub fn search_submit() -> String {
        "form > button[type='submit']".into()
    }
    pub fn info_panel() -> String {
        "#info".into()
    }
    pub fn info_heading() -> String {
        "#info h1".into()
    }
    pub fn info_fields() -> String {
        "#info p".into()
    }
    pub fn candidate_list() -> String {
        "div#main > div.novelslistss".into()
    }
    pub fn chapter_links() -> String {
        "div#list > dl > center ~ dd > a".into()
    }
    pub fn chapter_title() -> String {
        "div.bookname > h1".into()
    }
    pub fn chapter_content() -> String {
        "div#content".into()
    }
    pub fn watermark() -> String {
        "笔趣阁 www.bbiquge.org，最快更新{name}最新章节！".into()
    }
}
