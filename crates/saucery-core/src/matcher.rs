//! Regex link matchers. Pure pattern extraction, no network calls;
//! malformed or partial URLs simply fail to match.

use std::sync::OnceLock;

use regex::Regex;

/// Supported content platforms, highest dispatch priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Pixiv,
    Twitter,
    Tiktok,
    Instagram,
}

/// A classified link found in a message.
#[derive(Clone, Debug)]
pub struct LinkMatch {
    pub platform: Platform,
    /// First matched substring, as written in the message.
    pub text: String,
    /// Platform identifiers, in order of appearance.
    pub ids: Vec<String>,
}

const PIXIV: &str = r"(?i)https?://(?:www\.)?pixiv\.net/(?:en/)?artworks/(\d+)(?:\?\S+)?";
const TWITTER: &str = r"(?i)https?://(?:mobile\.|www\.)?twitter\.com/(\w{1,15}/status)/(\d+)(?:\?\S+)?";
const TIKTOK: &str = r"(?i)https?://www\.tiktok\.com/@(\w+)/video/(\d+)";
const INSTAGRAM: &str = r"(?i)https?://www\.instagram\.com/p/(\w{11})";

/// The compiled pattern for one platform.
pub fn pattern(platform: Platform) -> &'static Regex {
    match platform {
        Platform::Pixiv => {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new(PIXIV).expect("valid pixiv pattern"))
        }
        Platform::Twitter => {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new(TWITTER).expect("valid twitter pattern"))
        }
        Platform::Tiktok => {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new(TIKTOK).expect("valid tiktok pattern"))
        }
        Platform::Instagram => {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new(INSTAGRAM).expect("valid instagram pattern"))
        }
    }
}

/// Which capture group carries the content id.
fn id_group(platform: Platform) -> usize {
    match platform {
        Platform::Pixiv | Platform::Instagram => 1,
        Platform::Twitter | Platform::Tiktok => 2,
    }
}

/// Scan a message for supported links.
///
/// Returns at most one match, for the highest-priority platform present;
/// the router only dispatches once per message.
pub fn find_links(content: &str) -> Option<LinkMatch> {
    const ORDER: [Platform; 4] = [
        Platform::Pixiv,
        Platform::Twitter,
        Platform::Tiktok,
        Platform::Instagram,
    ];

    for platform in ORDER {
        let re = pattern(platform);
        let mut text = None;
        let mut ids = Vec::new();

        for caps in re.captures_iter(content) {
            if text.is_none() {
                text = Some(caps[0].to_string());
            }
            if let Some(id) = caps.get(id_group(platform)) {
                ids.push(id.as_str().to_string());
            }
        }

        if let Some(text) = text {
            return Some(LinkMatch {
                platform,
                text,
                ids,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_matches_nothing() {
        assert!(find_links("hello").is_none());
    }

    #[test]
    fn partial_urls_are_ignored() {
        assert!(find_links("pixiv.net/artworks/123").is_none());
        assert!(find_links("https://pixiv.net/artworks/").is_none());
    }

    #[test]
    fn extracts_pixiv_id() {
        let m = find_links("look https://www.pixiv.net/en/artworks/97552299?utm=1").unwrap();
        assert_eq!(m.platform, Platform::Pixiv);
        assert_eq!(m.ids, vec!["97552299"]);
    }

    #[test]
    fn extracts_all_twitter_ids() {
        let m = find_links(
            "https://twitter.com/user/status/100 and https://mobile.twitter.com/other/status/200",
        )
        .unwrap();
        assert_eq!(m.platform, Platform::Twitter);
        assert_eq!(m.ids, vec!["100", "200"]);
        assert_eq!(m.text, "https://twitter.com/user/status/100");
    }

    #[test]
    fn pixiv_takes_priority_over_twitter() {
        let m = find_links(
            "https://twitter.com/a/status/1 https://www.pixiv.net/artworks/42",
        )
        .unwrap();
        assert_eq!(m.platform, Platform::Pixiv);
    }

    #[test]
    fn matches_tiktok_and_instagram() {
        let t = find_links("https://www.tiktok.com/@someone/video/7012345").unwrap();
        assert_eq!(t.platform, Platform::Tiktok);
        assert_eq!(t.ids, vec!["7012345"]);

        let i = find_links("https://www.instagram.com/p/CaBcDeFgHiJ/").unwrap();
        assert_eq!(i.platform, Platform::Instagram);
        assert_eq!(i.ids, vec!["CaBcDeFgHiJ"]);
    }
}
