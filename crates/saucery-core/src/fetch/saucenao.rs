//! SauceNAO reverse-image search client.
//!
//! Raw results are index-discriminated; one dispatch function normalizes
//! every supported index into the flat [`SauceResult`] record. Shapes the
//! dispatch does not recognize are logged and dropped.

use serde::Deserialize;
use serde_json::Value;

use crate::Result;

const SEARCH_ENDPOINT: &str = "https://saucenao.com/search.php";

/// Results below this similarity are dropped by [`filter_results`] callers.
pub const MIN_SIMILARITY: f32 = 60.0;
/// At most this many results survive filtering.
pub const RESULT_CAP: usize = 10;

/// Source databases this bot knows how to normalize, by SauceNAO index id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SauceIndex {
    Pixiv,
    PixivHistorical,
    NicoSeiga,
    Danbooru,
    Nijie,
    Yandere,
    HMisc,
    Anime,
    Sankaku,
    BcyIllust,
    BcyCosplay,
    DeviantArt,
    Pawoo,
    Madokami,
    FurAffinity,
    Twitter,
    FurryNetwork,
    Skeb,
}

impl SauceIndex {
    pub fn from_id(id: u32) -> Option<Self> {
        Some(match id {
            5 => Self::Pixiv,
            6 => Self::PixivHistorical,
            8 => Self::NicoSeiga,
            9 => Self::Danbooru,
            11 => Self::Nijie,
            12 => Self::Yandere,
            18 | 38 => Self::HMisc,
            21 => Self::Anime,
            27 => Self::Sankaku,
            31 => Self::BcyIllust,
            32 => Self::BcyCosplay,
            34 => Self::DeviantArt,
            35 => Self::Pawoo,
            36 => Self::Madokami,
            40 => Self::FurAffinity,
            41 => Self::Twitter,
            42 => Self::FurryNetwork,
            44 => Self::Skeb,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Creator {
    pub id: String,
    pub name: String,
    pub link: String,
}

/// One normalized search result.
#[derive(Clone, Debug)]
pub struct SauceResult {
    pub index: SauceIndex,
    pub similarity: f32,
    pub thumbnail: String,
    pub urls: Vec<String>,
    pub title: Option<String>,
    pub creator: Option<Creator>,
    pub link: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    header: RawHeader,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct RawHeader {
    similarity: String,
    thumbnail: String,
    index_id: u32,
}

pub struct SauceClient {
    http: reqwest::Client,
    api_key: String,
}

impl SauceClient {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }

    /// Search every index for an image URL.
    pub async fn search(&self, image_url: &str) -> Result<Vec<SauceResult>> {
        let response: SearchResponse = self
            .http
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("db", "999"),
                ("output_type", "2"),
                ("api_key", self.api_key.as_str()),
                ("url", image_url),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut results = Vec::new();
        for entry in &response.results {
            match normalize(entry) {
                Some(result) => results.push(result),
                None => {
                    tracing::debug!(index_id = entry.header.index_id, "unparsed sauce result");
                }
            }
        }
        Ok(results)
    }
}

/// Keep results above the similarity threshold, best first, capped.
pub fn filter_results(
    mut results: Vec<SauceResult>,
    min_similarity: f32,
    cap: usize,
) -> Vec<SauceResult> {
    results.retain(|s| s.similarity > min_similarity);
    results.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(cap);
    results
}

fn normalize(entry: &RawEntry) -> Option<SauceResult> {
    let index = SauceIndex::from_id(entry.header.index_id)?;
    let similarity: f32 = entry.header.similarity.parse().ok()?;
    let data = &entry.data;
    let urls = ext_urls(data);
    let first_url = urls.first().cloned().unwrap_or_default();

    let (title, creator, link) = match index {
        SauceIndex::Pixiv | SauceIndex::PixivHistorical => {
            let artwork_id = any_string(data, "pixiv_id")?;
            let member_id = any_string(data, "member_id")?;
            let creator = Creator {
                id: member_id.clone(),
                name: str_field(data, "member_name")?,
                link: format!("https://www.pixiv.net/users/{member_id}"),
            };
            (
                str_field(data, "title"),
                Some(creator),
                format!("https://www.pixiv.net/artworks/{artwork_id}"),
            )
        }
        SauceIndex::NicoSeiga => {
            let artwork_id = any_string(data, "seiga_id")?;
            let member_id = any_string(data, "member_id")?;
            let creator = Creator {
                id: member_id.clone(),
                name: str_field(data, "member_name")?,
                link: format!("https://seiga.nicovideo.jp/user/illust/{member_id}"),
            };
            (
                str_field(data, "title"),
                Some(creator),
                format!("https://seiga.nicovideo.jp/seiga/im{artwork_id}"),
            )
        }
        SauceIndex::Danbooru => {
            let artwork_id = any_string(data, "danbooru_id")?;
            let name = str_field(data, "creator")?;
            let creator = Creator {
                id: name.clone(),
                name: name.clone(),
                link: format!("https://danbooru.donmai.us/posts?tags={name}&z=1"),
            };
            let characters = str_field(data, "characters").unwrap_or_default();
            let material = str_field(data, "material").unwrap_or_default();
            let title = if material.is_empty() {
                format!("{characters} drawn by {name}")
            } else {
                format!("{characters} ({material}) drawn by {name}")
            };
            (
                Some(title),
                Some(creator),
                format!("https://danbooru.donmai.us/post/show/{artwork_id}"),
            )
        }
        SauceIndex::Nijie => {
            let artwork_id = any_string(data, "nijie_id")?;
            let member_id = any_string(data, "member_id")?;
            let creator = Creator {
                id: member_id.clone(),
                name: str_field(data, "member_name")?,
                link: format!("https://nijie.info/members.php?id={member_id}"),
            };
            (
                str_field(data, "title"),
                Some(creator),
                format!("https://nijie.info/view.php?id={artwork_id}"),
            )
        }
        SauceIndex::Yandere => {
            let artwork_id = any_string(data, "yandere_id")?;
            let name = str_field(data, "creator")?;
            let creator = Creator {
                id: name.clone(),
                name: name.clone(),
                link: format!("https://yande.re/post?tags={name}"),
            };
            let title = join_present(&[
                name.as_str(),
                &str_field(data, "material").unwrap_or_default(),
                &str_field(data, "characters").unwrap_or_default(),
            ]);
            (
                Some(title),
                Some(creator),
                format!("https://yande.re/post/show/{artwork_id}"),
            )
        }
        SauceIndex::HMisc => {
            let names = creator_names(data);
            let creator = Creator {
                id: String::new(),
                name: names,
                link: String::new(),
            };
            let title = str_field(data, "eng_name")
                .filter(|s| !s.is_empty())
                .or_else(|| str_field(data, "jp_name"));
            (title, Some(creator), String::new())
        }
        SauceIndex::Anime => {
            let anime_id = any_string(data, "anidb_aid")?;
            (
                str_field(data, "source"),
                None,
                format!("https://anidb.net/anime/{anime_id}"),
            )
        }
        SauceIndex::Sankaku => {
            let artwork_id = any_string(data, "sankaku_id")?;
            let name = str_field(data, "creator")?;
            let creator = Creator {
                id: name.clone(),
                name: name.clone(),
                link: format!("https://chan.sankakucomplex.com/?tags={name}"),
            };
            let title = join_list(&[
                &str_field(data, "material").unwrap_or_default(),
                &str_field(data, "characters").unwrap_or_default(),
                name.as_str(),
            ]);
            (
                Some(title),
                Some(creator),
                format!("https://chan.sankakucomplex.com/post/show/{artwork_id}"),
            )
        }
        SauceIndex::BcyIllust | SauceIndex::BcyCosplay => {
            let member_id = any_string(data, "member_id")?;
            let member_link_id = any_string(data, "member_link_id")?;
            let creator = Creator {
                id: member_id,
                name: str_field(data, "member_name")?,
                link: format!("https://bcy.net/u/{member_link_id}"),
            };
            (str_field(data, "title"), Some(creator), first_url.clone())
        }
        SauceIndex::DeviantArt => {
            let name = str_field(data, "author_name")?;
            let creator = Creator {
                id: name.to_lowercase(),
                name,
                link: str_field(data, "author_url").unwrap_or_default(),
            };
            (str_field(data, "title"), Some(creator), first_url.clone())
        }
        SauceIndex::Pawoo => {
            let acct = format!("@{}", any_string(data, "pawoo_user_acct")?);
            let artwork_id = any_string(data, "pawoo_id")?;
            let creator = Creator {
                id: acct.clone(),
                name: str_field(data, "pawoo_user_display_name").unwrap_or_default(),
                link: format!("https://pawoo.net/{acct}"),
            };
            (
                None,
                Some(creator),
                format!("https://pawoo.net/{acct}/{artwork_id}"),
            )
        }
        SauceIndex::Madokami => {
            let series_id = any_string(data, "mu_id")?;
            let source = str_field(data, "source")?;
            let link = format!("https://www.mangaupdates.com/series.html?id={series_id}");
            let creator = Creator {
                id: source.clone(),
                name: source.clone(),
                link: link.clone(),
            };
            (Some(source), Some(creator), link)
        }
        SauceIndex::FurAffinity => {
            let author_url = str_field(data, "author_url").unwrap_or_default();
            let creator = Creator {
                id: author_url
                    .rsplit('/')
                    .find(|s| !s.is_empty())
                    .unwrap_or_default()
                    .to_string(),
                name: str_field(data, "author_name")?,
                link: author_url,
            };
            (str_field(data, "title"), Some(creator), first_url.clone())
        }
        SauceIndex::Twitter => {
            let handle = str_field(data, "twitter_user_handle")?;
            let tweet_id = any_string(data, "tweet_id")?;
            let creator = Creator {
                id: any_string(data, "twitter_user_id").unwrap_or_default(),
                name: handle.clone(),
                link: format!("https://twitter.com/{handle}"),
            };
            (
                None,
                Some(creator),
                format!("https://twitter.com/{handle}/status/{tweet_id}"),
            )
        }
        SauceIndex::FurryNetwork => {
            let name = str_field(data, "author_name")?;
            let creator = Creator {
                id: name.clone(),
                name,
                link: str_field(data, "author_url").unwrap_or_default(),
            };
            (str_field(data, "title"), Some(creator), first_url.clone())
        }
        SauceIndex::Skeb => {
            let creator = Creator {
                id: str_field(data, "creator")?,
                name: str_field(data, "creator_name").unwrap_or_default(),
                link: str_field(data, "author_url").unwrap_or_default(),
            };
            (None, Some(creator), first_url.clone())
        }
    };

    Some(SauceResult {
        index,
        similarity,
        thumbnail: entry.header.thumbnail.clone(),
        urls,
        title,
        creator,
        link,
    })
}

fn str_field(data: &Value, key: &str) -> Option<String> {
    data.get(key)?.as_str().map(str::to_string)
}

/// Accepts both string and number fields; SauceNAO mixes them per index.
fn any_string(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `ext_urls` arrives as an array or a numeric-keyed object depending on
/// the index.
fn ext_urls(data: &Value) -> Vec<String> {
    match data.get("ext_urls") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::Object(map)) => map
            .values()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// H-Misc creators arrive as a numeric-keyed object (or array) of names.
fn creator_names(data: &Value) -> String {
    match data.get("creator") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(map)) => map
            .values()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn join_present(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_list(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index_id: u32, similarity: &str, data: Value) -> RawEntry {
        RawEntry {
            header: RawHeader {
                similarity: similarity.to_string(),
                thumbnail: "https://img3.saucenao.com/thumb.jpg".to_string(),
                index_id,
            },
            data,
        }
    }

    fn result(similarity: f32) -> SauceResult {
        SauceResult {
            index: SauceIndex::Pixiv,
            similarity,
            thumbnail: String::new(),
            urls: Vec::new(),
            title: None,
            creator: None,
            link: String::new(),
        }
    }

    #[test]
    fn normalizes_pixiv_entry() {
        let raw = entry(
            5,
            "91.23",
            serde_json::json!({
                "ext_urls": ["https://www.pixiv.net/member_illust.php?mode=medium&illust_id=1"],
                "title": "untitled",
                "pixiv_id": 97552299,
                "member_name": "someone",
                "member_id": "123"
            }),
        );
        let sauce = normalize(&raw).unwrap();

        assert_eq!(sauce.index, SauceIndex::Pixiv);
        assert_eq!(sauce.similarity, 91.23);
        assert_eq!(sauce.link, "https://www.pixiv.net/artworks/97552299");
        assert_eq!(sauce.creator.unwrap().name, "someone");
        assert_eq!(sauce.urls.len(), 1);
    }

    #[test]
    fn normalizes_twitter_entry() {
        let raw = entry(
            41,
            "78.0",
            serde_json::json!({
                "ext_urls": ["https://twitter.com/someone/status/100"],
                "created_at": "2022-04-15",
                "tweet_id": "100",
                "twitter_user_id": "7",
                "twitter_user_handle": "someone"
            }),
        );
        let sauce = normalize(&raw).unwrap();
        assert_eq!(sauce.link, "https://twitter.com/someone/status/100");
        assert_eq!(sauce.title, None);
    }

    #[test]
    fn unknown_index_is_unparsed() {
        let raw = entry(999, "90.0", serde_json::json!({}));
        assert!(normalize(&raw).is_none());
    }

    #[test]
    fn filter_keeps_above_threshold_sorted_and_capped() {
        let results = vec![result(70.0), result(90.0), result(40.0)];
        let kept = filter_results(results, 80.0, 10);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].similarity, 90.0);

        let many = (0..20).map(|i| result(61.0 + i as f32)).collect::<Vec<_>>();
        let kept = filter_results(many, 60.0, 10);
        assert_eq!(kept.len(), 10);
        assert!(kept.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }
}
