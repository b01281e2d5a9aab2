//! Human-readable labels for the selection panel.

use url::Url;

use crate::host::VideoElement;

pub const MAX_TITLE_CHARS: usize = 50;
pub const UNKNOWN_SOURCE: &str = "Unknown source";

/// First non-blank label among the element's own attributes, its nearest
/// titled ancestor and its enclosing article heading, else `Video N`
/// counted from 1. Trimmed, then cut to [`MAX_TITLE_CHARS`] characters.
pub fn resolve_title(element: &dyn VideoElement, dom_index: usize) -> String {
    let candidates = [
        element.attribute("title"),
        element.attribute("aria-label"),
        element.attribute("data-title"),
        element.ancestor_title(),
        element.article_heading(),
    ];

    let title = candidates
        .into_iter()
        .flatten()
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| format!("Video {}", dom_index + 1));

    truncate_chars(&title, MAX_TITLE_CHARS)
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Host name of `src` resolved against the page URL. Falls back to the
/// page's own host, then to `"Unknown"`.
pub fn resolve_domain(src: &str, page_url: &str) -> String {
    let page = Url::parse(page_url).ok();
    let resolved = match &page {
        Some(base) => base.join(src),
        None => Url::parse(src),
    };

    resolved
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .or_else(|| page.and_then(|p| p.host_str().map(str::to_string)))
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DocumentSnapshot, Host, StaticHost, VideoSnapshot};

    fn element(snapshot: VideoSnapshot) -> std::sync::Arc<dyn VideoElement> {
        let host = StaticHost::new(DocumentSnapshot {
            videos: vec![snapshot],
            ..Default::default()
        });
        host.videos().remove(0)
    }

    #[test]
    fn title_prefers_own_attribute() {
        let mut snapshot = VideoSnapshot {
            ancestor_title: Some("Ancestor".into()),
            ..Default::default()
        };
        snapshot
            .attributes
            .insert("aria-label".into(), "  Labelled clip  ".into());
        assert_eq!(resolve_title(element(snapshot).as_ref(), 0), "Labelled clip");
    }

    #[test]
    fn blank_attributes_fall_through() {
        let mut snapshot = VideoSnapshot {
            article_heading: Some("Match highlights".into()),
            ..Default::default()
        };
        snapshot.attributes.insert("title".into(), "   ".into());
        assert_eq!(
            resolve_title(element(snapshot).as_ref(), 0),
            "Match highlights"
        );
    }

    #[test]
    fn positional_fallback_counts_from_one() {
        let video = element(VideoSnapshot::default());
        assert_eq!(resolve_title(video.as_ref(), 2), "Video 3");
    }

    #[test]
    fn long_titles_are_cut_after_trimming() {
        let mut snapshot = VideoSnapshot::default();
        snapshot
            .attributes
            .insert("title".into(), format!("  {}", "é".repeat(80)));
        let title = resolve_title(element(snapshot).as_ref(), 0);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
        assert!(title.starts_with('é'));
    }

    #[test]
    fn domain_resolution() {
        let page = "https://news.example.com/story/1";
        assert_eq!(
            resolve_domain("https://cdn.example.net/v.mp4", page),
            "cdn.example.net"
        );
        assert_eq!(resolve_domain("/media/v.mp4", page), "news.example.com");
        assert_eq!(resolve_domain(UNKNOWN_SOURCE, page), "news.example.com");
        // blob: URLs have no host of their own.
        assert_eq!(
            resolve_domain("blob:https://news.example.com/0b1c", page),
            "news.example.com"
        );
        assert_eq!(resolve_domain("not a url", "also not"), "Unknown");
    }
}
