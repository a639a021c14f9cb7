//! End-to-end tests for reading and writing RSS feeds.
//!
//! Uses fixture feeds with Media RSS thumbnails, CDATA descriptions and
//! content the bindings do not cover.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use regelrecht_binding::rss::{rss_binder, RssFeed, MEDIA_NAMESPACE};
use regelrecht_binding::{BindingConfig, BindingError};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("rss")
        .join(name)
}

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn read_feed(config: BindingConfig, name: &str) -> Result<RssFeed, BindingError> {
    rss_binder(config).unwrap().read_str(&load_fixture(name))
}

#[test]
fn test_read_feed_strict() {
    let feed = read_feed(BindingConfig::default(), "feed.xml").unwrap();
    assert_eq!(feed.version, "2.0");

    let channel = feed.channel.as_ref().unwrap();
    assert_eq!(channel.title, "Regelrecht nieuws");
    assert_eq!(
        channel.description,
        "Updates about machine readable law & tooling"
    );
    assert_eq!(channel.language.as_deref(), Some("nl-NL"));
    assert_eq!(
        channel.pub_date.map(|date| date.to_rfc3339()).as_deref(),
        Some("2025-01-14T09:00:00+01:00")
    );

    let image = channel.image.as_ref().unwrap();
    assert_eq!(image.url, "https://example.org/logo.png");
    assert_eq!(image.width, Some(144));
    assert_eq!(image.height, Some(48));

    assert_eq!(feed.item_count(), 3);
}

#[test]
fn test_items_keep_document_order() {
    let feed = read_feed(BindingConfig::default(), "feed.xml").unwrap();
    let titles: Vec<&str> = feed
        .channel
        .as_ref()
        .unwrap()
        .items
        .iter()
        .map(|item| item.title.as_str())
        .collect();
    assert_eq!(
        titles,
        vec!["Zorgtoeslag 2025 harvested", "Engine release", "Editor preview"]
    );
}

#[test]
fn test_item_details() {
    let feed = read_feed(BindingConfig::default(), "feed.xml").unwrap();
    let items = &feed.channel.as_ref().unwrap().items;

    let first = &items[0];
    assert_eq!(
        first.description.as_deref(),
        Some("The <b>Wet op de zorgtoeslag</b> is available as YAML.")
    );
    assert_eq!(first.author.as_deref(), Some("team@example.org (Team)"));
    assert_eq!(first.categories, vec!["harvester", "zorgtoeslag"]);
    let thumbnail = first.thumbnail.as_ref().unwrap();
    assert_eq!(thumbnail.url, "https://example.org/img/zorg.png");
    assert_eq!((thumbnail.width, thumbnail.height), (Some(120), Some(80)));

    let guids: Vec<(Option<bool>, &str)> = items
        .iter()
        .map(|item| {
            let guid = item.guid.as_ref().unwrap();
            (guid.is_perma_link, guid.value.as_str())
        })
        .collect();
    assert_eq!(
        guids,
        vec![
            (Some(true), "https://example.org/nieuws/zorgtoeslag-2025"),
            (Some(false), "urn:regelrecht:engine:0.4"),
            (Some(false), "editor-preview"),
        ]
    );

    let second = &items[1];
    assert!(second.link.is_none());
    assert!(second.thumbnail.is_none());
    assert!(second.categories.is_empty());
}

#[test]
fn test_round_trip() {
    let binder = rss_binder(BindingConfig::default()).unwrap();
    let feed: RssFeed = binder.read_str(&load_fixture("feed.xml")).unwrap();

    let written = binder.write_string(&feed).unwrap();
    let read_back: RssFeed = binder.read_str(&written).unwrap();
    assert_eq!(read_back, feed);
    assert_eq!(binder.write_string(&read_back).unwrap(), written);
}

#[test]
fn test_written_feed_is_well_formed() {
    let binder = rss_binder(BindingConfig::default()).unwrap();
    let feed: RssFeed = binder.read_str(&load_fixture("feed.xml")).unwrap();
    let written = binder.write_string(&feed).unwrap();

    assert!(written.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><rss xmlns:media="#));
    assert_eq!(written.matches("xmlns:media").count(), 1);
    assert!(written.contains(
        "<description><![CDATA[The <b>Wet op de zorgtoeslag</b> is available as YAML.]]></description>"
    ));
    assert!(written.contains("<pubDate>Mon, 13 Jan 2025 15:30:00 +0100</pubDate>"));

    let doc = roxmltree::Document::parse(&written).unwrap();
    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "rss");
    assert_eq!(root.attribute("version"), Some("2.0"));

    let thumbnails: Vec<_> = doc
        .descendants()
        .filter(|node| node.tag_name().name() == "thumbnail")
        .collect();
    assert_eq!(thumbnails.len(), 2);
    assert!(thumbnails
        .iter()
        .all(|node| node.tag_name().namespace() == Some(MEDIA_NAMESPACE)));
}

#[test]
fn test_unmapped_content_strict() {
    let result = read_feed(BindingConfig::default(), "feed_extra.xml");
    match result {
        Err(BindingError::UnreadElement { name, path }) => {
            assert_eq!(name, "atom:link");
            assert_eq!(path.to_string(), "/rss/channel");
        }
        other => panic!("expected UnreadElement, got {other:?}"),
    }
}

#[test]
fn test_unmapped_content_lenient() {
    let feed = read_feed(BindingConfig::default().lenient(), "feed_extra.xml").unwrap();
    let channel = feed.channel.as_ref().unwrap();
    assert_eq!(channel.title, "Extra");
    assert_eq!(channel.items.len(), 1);
    assert_eq!(channel.items[0].title, "First");
    assert_eq!(
        channel.items[0].thumbnail.as_ref().map(|t| t.url.as_str()),
        Some("https://example.org/1.png")
    );
}

#[test]
fn test_config_file_namespaces() {
    let config = BindingConfig::from_file(&fixture_path("binding.yaml")).unwrap();
    assert!(!config.strict);

    let binder = rss_binder(config).unwrap();
    let feed: RssFeed = binder.read_str(&load_fixture("feed_extra.xml")).unwrap();
    let written = binder.write_string(&feed).unwrap();

    assert!(written.contains(
        r#"<rss xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:media="http://search.yahoo.com/mrss/" version="2.0">"#
    ));
    assert_eq!(written.matches("xmlns:").count(), 2);
}

#[test]
fn test_truncated_feed_is_malformed() {
    let xml = load_fixture("feed.xml").replace("</rss>", "");
    let result = rss_binder(BindingConfig::default())
        .unwrap()
        .read_str::<RssFeed>(&xml);
    assert!(matches!(
        result,
        Err(BindingError::MalformedDocument { .. })
    ));
}

#[test]
fn test_bad_number_reports_path() {
    let xml = load_fixture("feed.xml").replace("<width>144</width>", "<width>wide</width>");
    let result = rss_binder(BindingConfig::default())
        .unwrap()
        .read_str::<RssFeed>(&xml);
    match result {
        Err(BindingError::Conversion { source, path }) => {
            assert_eq!(source.text, "wide");
            assert_eq!(path.to_string(), "/rss/channel/image/width");
        }
        other => panic!("expected Conversion, got {other:?}"),
    }
}

#[test]
fn test_read_and_write_files() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("copy.xml");

    let binder = rss_binder(BindingConfig::default()).unwrap();
    let feed: RssFeed = binder.read_file(&fixture_path("feed.xml")).unwrap();
    binder.write_file(&output, &feed).unwrap();

    let copy: RssFeed = binder.read_file(&output).unwrap();
    assert_eq!(copy, feed);
}
