//! Wire types returned by the esfwee REST API.

use serde::{Deserialize, Serialize};

use crate::model::page::ChapterId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manga {
    pub anilist_id: u64,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub storage_path: String,
    pub added_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u64,
    pub anilist_id: u64,
    pub chapter_number: f64,
    #[serde(default)]
    pub title: Option<String>,
    pub page_count: usize,
    pub storage_path: String,
    pub added_at: String,
}

impl Chapter {
    #[must_use]
    pub const fn chapter_id(&self) -> ChapterId {
        ChapterId(self.id)
    }

    /// `"Ch. 12"`, or `"Ch. 12.5"` for fractional releases.
    #[must_use]
    pub fn label(&self) -> String {
        format_chapter_label(self.chapter_number)
    }
}

#[must_use]
pub fn format_chapter_label(number: f64) -> String {
    if number.fract() == 0.0 {
        format!("Ch. {number:.0}")
    } else {
        format!("Ch. {number}")
    }
}

/// Reading order: ascending chapter number.
pub fn sort_chapters(chapters: &mut [Chapter]) {
    chapters.sort_by(|a: &Chapter, b: &Chapter| a.chapter_number.total_cmp(&b.chapter_number));
}
