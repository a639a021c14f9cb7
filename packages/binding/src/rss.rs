//! RSS 2.0 bindings with Media RSS thumbnails.
//!
//! A complete set of binding tables for a real-world document type, used by the
//! `rss` command of the CLI.

use chrono::{DateTime, FixedOffset};

use crate::binding::{BindingRegistry, BindingTable};
use crate::config::BindingConfig;
use crate::converter::{DateTimeConverter, DateTimeFormat};
use crate::engine::XmlBinder;
use crate::error::Result;
use crate::field;

/// Namespace URI of Media RSS.
pub const MEDIA_NAMESPACE: &str = "http://search.yahoo.com/mrss/";

/// Prefix used for Media RSS elements.
pub const MEDIA_PREFIX: &str = "media";

/// The `<rss>` document root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssFeed {
    pub version: String,
    pub channel: Option<RssChannel>,
}

/// A `<channel>` with its items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssChannel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: Option<String>,
    pub pub_date: Option<DateTime<FixedOffset>>,
    pub image: Option<RssImage>,
    pub items: Vec<RssItem>,
}

/// A channel `<image>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssImage {
    pub url: String,
    pub title: String,
    pub link: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// An `<item>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssItem {
    pub title: String,
    pub link: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub categories: Vec<String>,
    pub pub_date: Option<DateTime<FixedOffset>>,
    pub guid: Option<Guid>,
    pub thumbnail: Option<MediaThumbnail>,
}

/// An item `<guid>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Guid {
    pub is_perma_link: Option<bool>,
    pub value: String,
}

/// A `<media:thumbnail>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaThumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// RSS prescribes RFC 2822 dates; RFC 3339 is still accepted when reading.
fn rfc2822() -> DateTimeConverter {
    DateTimeConverter::new(DateTimeFormat::Rfc2822)
}

/// Create the binding tables for RSS documents.
pub fn create_rss_bindings() -> Result<BindingRegistry> {
    let mut registry = BindingRegistry::new();

    registry.register(
        BindingTable::<RssFeed>::new("rss")
            .namespace(MEDIA_PREFIX, MEDIA_NAMESPACE)
            .attribute("version", field!(RssFeed, version))
            .element("channel", field!(RssFeed, channel)),
    )?;

    registry.register(
        BindingTable::<RssChannel>::new("channel")
            .property("title", field!(RssChannel, title))
            .property("link", field!(RssChannel, link))
            .property("description", field!(RssChannel, description))
            .optional_property("language", field!(RssChannel, language))
            .optional_property_with("pubDate", field!(RssChannel, pub_date), rfc2822())
            .element("image", field!(RssChannel, image))
            .element_list("item", field!(RssChannel, items)),
    )?;

    registry.register(
        BindingTable::<RssImage>::new("image")
            .property("url", field!(RssImage, url))
            .property("title", field!(RssImage, title))
            .property("link", field!(RssImage, link))
            .optional_property("width", field!(RssImage, width))
            .optional_property("height", field!(RssImage, height)),
    )?;

    registry.register(
        BindingTable::<RssItem>::new("item")
            .property("title", field!(RssItem, title))
            .optional_property("link", field!(RssItem, link))
            .optional_property("description", field!(RssItem, description))
            .cdata()
            .optional_property("author", field!(RssItem, author))
            .property_list("category", field!(RssItem, categories))
            .optional_property_with("pubDate", field!(RssItem, pub_date), rfc2822())
            .element("guid", field!(RssItem, guid))
            .element("media:thumbnail", field!(RssItem, thumbnail)),
    )?;

    registry.register(
        BindingTable::<Guid>::new("guid")
            .optional_attribute("isPermaLink", field!(Guid, is_perma_link))
            .text(field!(Guid, value)),
    )?;

    registry.register(
        BindingTable::<MediaThumbnail>::new("media:thumbnail")
            .attribute("url", field!(MediaThumbnail, url))
            .optional_attribute("width", field!(MediaThumbnail, width))
            .optional_attribute("height", field!(MediaThumbnail, height)),
    )?;

    Ok(registry)
}

/// Create a binder for RSS documents.
pub fn rss_binder(config: BindingConfig) -> Result<XmlBinder> {
    XmlBinder::builder()
        .config(config)
        .bindings(create_rss_bindings()?)
        .build()
}

impl RssFeed {
    /// Number of items in the channel.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.channel.as_ref().map_or(0, |channel| channel.items.len())
    }
}
