//! Catalog markup extraction
//!
//! This module turns catalog pages into records:
//! - Pagination (how many listing pages an emulator has)
//! - Emulator index links
//! - Listing tiles (id, title, thumbnail, tags)
//! - `itemprop` metadata from detail pages
//! - The outbound link on download-redirect pages
//!
//! Missing markup is never an error. A selector that matches nothing yields
//! an absent field, and the record keeps the gap.

use crate::url::last_segment;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `itemprop` name → value, as found on a detail page
pub type Extras = BTreeMap<String, String>;

/// Attributes that may carry a tile's thumbnail, in order of preference
const THUMBNAIL_ATTRS: [&str; 4] = ["src", "srcset", "data-src", "data-srcset"];

/// A tag attached to a catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<String>,
    pub label: String,
}

/// One entry as shown on a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomTile {
    pub id: Option<String>,
    pub title: Option<String>,
    pub href: String,
    pub emulator: String,
    pub tags: Vec<Tag>,
    pub thumbnail: Option<String>,
}

/// A catalog entry with its detail-page metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub href: String,
    pub emulator: String,
    pub tags: Vec<Tag>,
    pub thumbnail: Option<String>,
    pub extras: Extras,
}

impl RomRecord {
    pub fn new(tile: RomTile, extras: Extras) -> Self {
        Self {
            id: tile.id,
            title: tile.title,
            href: tile.href,
            emulator: tile.emulator,
            tags: tile.tags,
            thumbnail: tile.thumbnail,
            extras,
        }
    }

    /// Cover image URL from the detail page
    pub fn image(&self) -> Option<&str> {
        self.extra("image")
    }

    /// URL of the page that redirects to the ROM file
    pub fn download_url(&self) -> Option<&str> {
        self.extra("downloadUrl")
    }

    fn extra(&self, name: &str) -> Option<&str> {
        self.extras
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Number of listing pages, read from the last pagination link
///
/// Defaults to 1 when there is no pagination or it cannot be read.
///
/// # Example
///
/// ```
/// use romstash::crawler::extract_page_count;
/// use scraper::Html;
///
/// let html = r#"<ul><li class="page-item"><a href="/roms/nes/page/2">2</a></li>
///     <li class="page-item"><a href="/roms/nes/page/37">Last</a></li></ul>"#;
/// assert_eq!(extract_page_count(&Html::parse_document(html)), 37);
/// ```
pub fn extract_page_count(document: &Html) -> u32 {
    first(document.root_element(), "li.page-item:last-child a")
        .and_then(|a| a.value().attr("href"))
        .and_then(last_segment)
        .and_then(|segment| segment.parse::<u32>().ok())
        .filter(|&count| count > 0)
        .unwrap_or(1)
}

/// Emulator slugs linked from the catalog index, deduplicated
pub fn extract_emulators(document: &Html) -> Vec<String> {
    let mut emulators: Vec<String> = Vec::new();
    for anchor in all(document.root_element(), ".infoBox a") {
        if let Some(slug) = anchor.value().attr("href").and_then(last_segment) {
            if !emulators.iter().any(|e| e == slug) {
                emulators.push(slug.to_string());
            }
        }
    }
    emulators
}

/// Every listing tile on a page, in document order
pub fn extract_tiles(document: &Html) -> Vec<RomTile> {
    all(document.root_element(), ".thumbnail-home")
        .into_iter()
        .map(extract_tile)
        .collect()
}

fn extract_tile(tile: ElementRef<'_>) -> RomTile {
    let anchor = first(tile, ".infoBox a");
    let href = anchor
        .and_then(|a| a.value().attr("href"))
        .unwrap_or_default()
        .to_string();

    let thumbnail = first(tile, ".imgCon img").and_then(|img| {
        THUMBNAIL_ATTRS.iter().find_map(|attr| {
            let value = img.value().attr(attr)?.trim();
            let value = if attr.ends_with("srcset") {
                first_srcset_candidate(value)?
            } else {
                value
            };
            (!value.is_empty()).then(|| value.to_string())
        })
    });

    let tags = all(tile, "[rel='tag']")
        .into_iter()
        .map(|tag| Tag {
            id: tag
                .value()
                .attr("href")
                .and_then(last_segment)
                .map(str::to_string),
            label: text_of(tag),
        })
        .collect();

    RomTile {
        id: last_segment(&href).map(str::to_string),
        title: anchor.map(text_of).filter(|t| !t.is_empty()),
        href,
        emulator: first(tile, ".emulator").map(text_of).unwrap_or_default(),
        tags,
        thumbnail,
    }
}

/// `itemprop` metadata of a detail page
///
/// Each value is the element's `href`, else its `src`, else its trimmed
/// text. A name seen twice keeps the later value.
pub fn extract_extras(document: &Html) -> Extras {
    let mut extras = Extras::new();
    for element in all(document.root_element(), "[itemprop]") {
        let Some(name) = element.value().attr("itemprop") else {
            continue;
        };
        let value = ["href", "src"]
            .iter()
            .filter_map(|attr| element.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| text_of(element));
        extras.insert(name.to_string(), value);
    }
    extras
}

/// Target of the outbound link on a download-redirect page
pub fn extract_redirect(document: &Html) -> Option<String> {
    first(document.root_element(), "a[rel='nofollow']")
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

/// First URL of a `srcset` value
fn first_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset.split(',').next()?.split_whitespace().next()
}

fn first<'a>(root: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    let found = root.select(&selector).next();
    found
}

fn all<'a>(root: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => root.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
