//! Tweet fetcher: the vxtwitter embed proxy by default, the first-party v2
//! API when a bearer token is configured. Both normalize into [`Tweet`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::errors::Error;
use crate::Result;

pub const TWEET_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

const PROXY_BASE: &str = "https://api.vxtwitter.com/Twitter/status";
const API_BASE: &str = "https://api.twitter.com/2/tweets";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

#[derive(Clone, Debug)]
pub struct TweetMedia {
    pub kind: MediaKind,
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct TweetAuthor {
    pub name: String,
    pub handle: String,
    pub avatar: Option<String>,
}

/// Normalized tweet, independent of which upstream produced it.
#[derive(Clone, Debug)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    /// Unix seconds.
    pub created_at: i64,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub author: TweetAuthor,
    pub media: Vec<TweetMedia>,
}

impl Tweet {
    pub fn has_video(&self) -> bool {
        self.media.iter().any(|m| m.kind == MediaKind::Video)
    }
}

/// Self-expiring map: unbounded key count, per-entry TTL checked on access.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now()).await
    }

    pub async fn insert(&self, key: String, value: V) {
        self.insert_at(key, value, Instant::now()).await;
    }

    async fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some((deadline, value)) if now < *deadline => return Some(value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    async fn insert_at(&self, key: String, value: V, now: Instant) {
        self.entries
            .lock()
            .await
            .insert(key, (now + self.ttl, value));
    }
}

pub struct TwitterClient {
    http: reqwest::Client,
    bearer: Option<String>,
    cache: TtlCache<Tweet>,
}

impl TwitterClient {
    pub fn new(http: reqwest::Client, bearer: Option<String>) -> Self {
        Self {
            http,
            bearer,
            cache: TtlCache::new(TWEET_CACHE_TTL),
        }
    }

    /// Fetch a tweet by id, consulting the cache first.
    pub async fn get_tweet(&self, id: &str) -> Result<Tweet> {
        if let Some(hit) = self.cache.get(id).await {
            return Ok(hit);
        }

        let tweet = match &self.bearer {
            Some(token) => self.fetch_api(id, token).await?,
            None => self.fetch_proxy(id).await?,
        };

        self.cache.insert(id.to_string(), tweet.clone()).await;
        Ok(tweet)
    }

    async fn fetch_proxy(&self, id: &str) -> Result<Tweet> {
        let raw: ProxyTweet = self
            .http
            .get(format!("{PROXY_BASE}/{id}"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(normalize_proxy(raw, id))
    }

    async fn fetch_api(&self, id: &str, token: &str) -> Result<Tweet> {
        let raw: ApiResponse = self
            .http
            .get(format!("{API_BASE}/{id}"))
            .bearer_auth(token)
            .query(&[
                ("expansions", "author_id,attachments.media_keys"),
                ("tweet.fields", "created_at,public_metrics"),
                ("user.fields", "profile_image_url"),
                ("media.fields", "url,preview_image_url,type"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        normalize_api(raw)
    }
}

#[derive(Debug, Deserialize)]
struct ProxyTweet {
    text: String,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    retweets: u64,
    #[serde(default)]
    replies: u64,
    #[serde(default)]
    date_epoch: i64,
    user_name: String,
    user_screen_name: String,
    #[serde(rename = "tweetID", default)]
    tweet_id: String,
    #[serde(default)]
    media_extended: Vec<ProxyMedia>,
}

#[derive(Debug, Deserialize)]
struct ProxyMedia {
    #[serde(rename = "type")]
    kind: String,
    url: String,
}

fn normalize_proxy(raw: ProxyTweet, fallback_id: &str) -> Tweet {
    let id = if raw.tweet_id.is_empty() {
        fallback_id.to_string()
    } else {
        raw.tweet_id
    };

    Tweet {
        id,
        text: raw.text,
        created_at: raw.date_epoch,
        likes: raw.likes,
        retweets: raw.retweets,
        replies: raw.replies,
        author: TweetAuthor {
            name: raw.user_name,
            handle: raw.user_screen_name,
            avatar: None,
        },
        media: raw
            .media_extended
            .into_iter()
            .map(|m| TweetMedia {
                kind: media_kind(&m.kind),
                url: m.url,
            })
            .collect(),
    }
}

// The proxy reports animated media as "gif"; Discord needs those relayed
// as video links either way.
fn media_kind(raw: &str) -> MediaKind {
    match raw {
        "video" | "gif" => MediaKind::Video,
        _ => MediaKind::Photo,
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    data: ApiTweet,
    #[serde(default)]
    includes: ApiIncludes,
}

#[derive(Debug, Deserialize)]
struct ApiTweet {
    id: String,
    text: String,
    author_id: String,
    created_at: Option<String>,
    public_metrics: ApiMetrics,
}

#[derive(Debug, Default, Deserialize)]
struct ApiIncludes {
    #[serde(default)]
    users: Vec<ApiUser>,
    #[serde(default)]
    media: Vec<ApiMedia>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
    name: String,
    username: String,
    profile_image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiMetrics {
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
    #[serde(default)]
    like_count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiMedia {
    #[serde(rename = "type")]
    kind: String,
    url: Option<String>,
    preview_image_url: Option<String>,
}

fn normalize_api(raw: ApiResponse) -> Result<Tweet> {
    let author = raw
        .includes
        .users
        .iter()
        .find(|u| u.id == raw.data.author_id)
        .ok_or_else(|| Error::upstream("twitter", "author missing from response includes"))?;

    let created_at = raw
        .data
        .created_at
        .as_deref()
        .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.timestamp())
        .unwrap_or_default();

    let media = raw
        .includes
        .media
        .iter()
        .filter_map(|m| {
            // Video entries carry no direct url; fall back to the preview image.
            let url = m.url.clone().or_else(|| m.preview_image_url.clone())?;
            Some(TweetMedia {
                kind: media_kind(&m.kind),
                url,
            })
        })
        .collect();

    Ok(Tweet {
        id: raw.data.id,
        text: raw.data.text,
        created_at,
        likes: raw.data.public_metrics.like_count,
        retweets: raw.data.public_metrics.retweet_count,
        replies: raw.data.public_metrics.reply_count,
        author: TweetAuthor {
            name: author.name.clone(),
            handle: author.username.clone(),
            avatar: author.profile_image_url.clone(),
        },
        media,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_response_normalizes() {
        let json = r#"{
            "text": "hello",
            "likes": 5,
            "retweets": 2,
            "replies": 1,
            "date_epoch": 1650000000,
            "user_name": "Some One",
            "user_screen_name": "someone",
            "tweetID": "100",
            "media_extended": [
                { "type": "image", "url": "https://pbs.twimg.com/a.jpg" },
                { "type": "video", "url": "https://video.twimg.com/b.mp4" }
            ]
        }"#;
        let raw: ProxyTweet = serde_json::from_str(json).unwrap();
        let tweet = normalize_proxy(raw, "100");

        assert_eq!(tweet.author.handle, "someone");
        assert_eq!(tweet.created_at, 1650000000);
        assert_eq!(tweet.media[0].kind, MediaKind::Photo);
        assert!(tweet.has_video());
    }

    #[test]
    fn api_response_normalizes() {
        let json = r#"{
            "data": {
                "id": "100",
                "text": "hi",
                "author_id": "7",
                "created_at": "2022-04-15T10:00:00.000Z",
                "public_metrics": { "retweet_count": 3, "reply_count": 1, "like_count": 9 }
            },
            "includes": {
                "users": [
                    { "id": "7", "name": "Some One", "username": "someone",
                      "profile_image_url": "https://pbs.twimg.com/p.jpg" }
                ],
                "media": [
                    { "type": "photo", "url": "https://pbs.twimg.com/a.jpg" }
                ]
            }
        }"#;
        let raw: ApiResponse = serde_json::from_str(json).unwrap();
        let tweet = normalize_api(raw).unwrap();

        assert_eq!(tweet.likes, 9);
        assert_eq!(tweet.author.avatar.as_deref(), Some("https://pbs.twimg.com/p.jpg"));
        assert!(!tweet.has_video());
    }

    #[tokio::test]
    async fn cache_expires_per_entry() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(10));
        let start = Instant::now();

        cache.insert_at("a".to_string(), 1, start).await;
        assert_eq!(cache.get_at("a", start + Duration::from_secs(5)).await, Some(1));
        assert_eq!(cache.get_at("a", start + Duration::from_secs(10)).await, None);
        // An expired read removes the entry.
        assert_eq!(cache.get_at("a", start).await, None);
    }
}
