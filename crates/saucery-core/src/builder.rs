//! Reply construction: per-platform embed shapes and the payload packer.

use crate::domain::UploadTier;
use crate::fetch::pixiv::IllustMeta;
use crate::fetch::saucenao::SauceResult;
use crate::fetch::twitter::Tweet;
use crate::payload::{Attachment, Embed, EmbedAuthor, EmbedFooter, ReplyPayload};

pub const PIXIV_COLOR: u32 = 0x0097FA;
pub const TWITTER_COLOR: u32 = 0x00ACEE;

const PIXIV_ICON: &str = "https://www.pixiv.net/favicon.ico";
const TWITTER_ICON: &str = "https://abs.twimg.com/icons/apple-touch-icon-192x192.png";

/// Item ceiling per payload; Discord renders grouped embeds poorly past this.
pub const MAX_ITEMS_PER_PAYLOAD: usize = 5;

/// Attachment budget for one payload sequence.
#[derive(Clone, Copy, Debug)]
pub struct PackBudget {
    pub size_limit: usize,
    pub max_items: usize,
}

impl PackBudget {
    pub fn for_tier(tier: UploadTier) -> Self {
        Self {
            size_limit: tier.upload_limit(),
            max_items: MAX_ITEMS_PER_PAYLOAD,
        }
    }
}

/// One media unit: an embed plus the attachment it renders.
#[derive(Clone, Debug)]
pub struct MediaItem {
    pub embed: Embed,
    pub attachment: Attachment,
}

/// Packs media into payloads without exceeding the size budget or the
/// per-payload item ceiling.
///
/// An item individually larger than the budget is never yielded; it is
/// counted and reported once in the trailing summary payload from
/// [`PayloadPacker::finish`].
#[derive(Debug)]
pub struct PayloadPacker {
    budget: PackBudget,
    embeds: Vec<Embed>,
    attachments: Vec<Attachment>,
    size: usize,
    skipped: usize,
}

impl PayloadPacker {
    pub fn new(budget: PackBudget) -> Self {
        Self {
            budget,
            embeds: Vec::new(),
            attachments: Vec::new(),
            size: 0,
            skipped: 0,
        }
    }

    /// Add one item. Returns a finalized payload when the item ceiling was
    /// reached or the item would have pushed the current payload over
    /// budget; the item then opens the next payload.
    pub fn push(&mut self, item: MediaItem) -> Option<ReplyPayload> {
        if item.attachment.size() > self.budget.size_limit {
            self.skipped += 1;
            tracing::warn!(
                file = %item.attachment.filename,
                size = item.attachment.size(),
                "skipping file over the upload limit"
            );
            return None;
        }

        let flushed = if !self.embeds.is_empty()
            && (self.embeds.len() >= self.budget.max_items
                || self.size + item.attachment.size() > self.budget.size_limit)
        {
            Some(self.take_payload())
        } else {
            None
        };

        self.size += item.attachment.size();
        self.embeds.push(item.embed);
        self.attachments.push(item.attachment);

        flushed
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Flush the final partial payload, plus the skip summary if any item
    /// was dropped.
    pub fn finish(mut self) -> Vec<ReplyPayload> {
        let mut out = Vec::new();
        if !self.embeds.is_empty() {
            out.push(self.take_payload());
        }
        if self.skipped > 0 {
            out.push(ReplyPayload::text(format!(
                "Skipped {} file(s) larger than the upload limit.",
                self.skipped
            )));
        }
        out
    }

    fn take_payload(&mut self) -> ReplyPayload {
        self.size = 0;
        ReplyPayload {
            content: None,
            embeds: std::mem::take(&mut self.embeds),
            attachments: std::mem::take(&mut self.attachments),
            components: Vec::new(),
        }
    }
}

pub fn artwork_url(id: &str) -> String {
    format!("https://www.pixiv.net/artworks/{id}")
}

pub fn user_url(id: &str) -> String {
    format!("https://www.pixiv.net/users/{id}")
}

/// Per-page pixiv embed. The lead payload's first embed is further
/// decorated with title/author via [`decorate_pixiv_lead`].
pub fn pixiv_embed(filename: &str, created_at: Option<i64>) -> Embed {
    let mut embed = Embed::new()
        .color(PIXIV_COLOR)
        .image(format!("attachment://{filename}"))
        .footer(EmbedFooter::new("Pixiv").icon_url(PIXIV_ICON));
    if let Some(ts) = created_at {
        embed = embed.timestamp(ts);
    }
    embed
}

/// Stamp artwork metadata on the first embed of a sequence.
pub fn decorate_pixiv_lead(embed: &mut Embed, meta: &IllustMeta) {
    embed.title = Some(meta.title.clone());
    embed.url = Some(artwork_url(&meta.id));
    embed.author = Some(EmbedAuthor::new(meta.user_name.clone()).url(user_url(&meta.user_id)));
}

/// Tweet → embeds: the first carries author/text/metrics, the rest only
/// media. Every embed shares the same URL so Discord groups the images
/// into one card.
pub fn tweet_embeds(tweet: &Tweet) -> Vec<Embed> {
    let mut media = tweet.media.iter();
    let Some(first) = media.next() else {
        return Vec::new();
    };

    let mut author = EmbedAuthor::new(tweet.author.name.clone())
        .url(format!("https://twitter.com/{}", tweet.author.handle));
    if let Some(avatar) = &tweet.author.avatar {
        author = author.icon_url(avatar.clone());
    }

    let lead = Embed::new()
        .url("https://www.twitter.com/")
        .image(first.url.clone())
        .color(TWITTER_COLOR)
        .author(author)
        .description(tweet.text.clone())
        .field("Likes", tweet.likes.to_string(), true)
        .field("Retweets", tweet.retweets.to_string(), true)
        .footer(EmbedFooter::new("Twitter").icon_url(TWITTER_ICON))
        .timestamp(tweet.created_at);

    let mut embeds = vec![lead];
    for medium in media {
        embeds.push(
            Embed::new()
                .url("https://www.twitter.com/")
                .image(medium.url.clone()),
        );
    }
    embeds
}

/// One embed per kept reverse-search result.
pub fn sauce_embed(sauce: &SauceResult) -> Embed {
    let description = sauce
        .urls
        .iter()
        .map(|url| format!("[{}]({url})", url_host(url)))
        .collect::<Vec<_>>()
        .join("\n");

    Embed::new()
        .author(EmbedAuthor::new(
            sauce.title.clone().unwrap_or_else(|| "No title".to_string()),
        ))
        .thumbnail(sauce.thumbnail.clone())
        .description(description)
        .footer(EmbedFooter::new(format!("Similarity: {}", sauce.similarity)))
}

fn url_host(url: &str) -> &str {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    rest.split('/').next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::twitter::{MediaKind, TweetAuthor, TweetMedia};

    fn item(size: usize) -> MediaItem {
        MediaItem {
            embed: pixiv_embed("a.png", None),
            attachment: Attachment::new("a.png", vec![0u8; size]),
        }
    }

    fn pack_all(budget: PackBudget, items: Vec<MediaItem>) -> (Vec<ReplyPayload>, usize) {
        let mut packer = PayloadPacker::new(budget);
        let mut payloads = Vec::new();
        for it in items {
            if let Some(p) = packer.push(it) {
                payloads.push(p);
            }
        }
        let skipped = packer.skipped();
        payloads.extend(packer.finish());
        (payloads, skipped)
    }

    fn payload_size(p: &ReplyPayload) -> usize {
        p.attachments.iter().map(|a| a.size()).sum()
    }

    #[test]
    fn single_small_item_is_one_payload() {
        let budget = PackBudget {
            size_limit: 100,
            max_items: 5,
        };
        let (payloads, skipped) = pack_all(budget, vec![item(10)]);
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].embeds.len(), 1);
        assert_eq!(payloads[0].attachments.len(), 1);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn never_exceeds_budget_or_item_ceiling() {
        let budget = PackBudget {
            size_limit: 100,
            max_items: 3,
        };
        let items = vec![
            item(40),
            item(40),
            item(40), // overflows size, starts payload 2
            item(10),
            item(10), // hits item ceiling with the next push
            item(10),
        ];
        let (payloads, skipped) = pack_all(budget, items);
        assert_eq!(skipped, 0);
        for p in &payloads {
            assert!(payload_size(p) <= budget.size_limit);
            assert!(p.embeds.len() <= budget.max_items);
        }
        let total: usize = payloads.iter().map(|p| p.embeds.len()).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn oversized_item_is_skipped_and_summarized_once() {
        let budget = PackBudget {
            size_limit: 100,
            max_items: 5,
        };
        let (payloads, skipped) = pack_all(budget, vec![item(10), item(500), item(10)]);
        assert_eq!(skipped, 1);

        // No yielded payload contains the oversized item.
        for p in &payloads {
            assert!(payload_size(p) <= budget.size_limit);
        }

        // Trailing summary reports the count.
        let summary = payloads.last().unwrap();
        assert!(summary.attachments.is_empty());
        assert!(summary.content.as_deref().unwrap().contains("1 file(s)"));
    }

    #[test]
    fn overflow_item_opens_the_next_payload() {
        let budget = PackBudget {
            size_limit: 100,
            max_items: 5,
        };
        let (payloads, _) = pack_all(budget, vec![item(60), item(60)]);
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].embeds.len(), 1);
        assert_eq!(payloads[1].embeds.len(), 1);
    }

    #[test]
    fn tweet_embeds_lead_carries_metrics() {
        let tweet = Tweet {
            id: "100".to_string(),
            text: "hi".to_string(),
            created_at: 1650000000,
            likes: 9,
            retweets: 3,
            replies: 1,
            author: TweetAuthor {
                name: "Some One".to_string(),
                handle: "someone".to_string(),
                avatar: None,
            },
            media: vec![
                TweetMedia {
                    kind: MediaKind::Photo,
                    url: "https://pbs.twimg.com/a.jpg".to_string(),
                },
                TweetMedia {
                    kind: MediaKind::Photo,
                    url: "https://pbs.twimg.com/b.jpg".to_string(),
                },
            ],
        };
        let embeds = tweet_embeds(&tweet);
        assert_eq!(embeds.len(), 2);
        assert_eq!(embeds[0].fields.len(), 2);
        assert_eq!(embeds[0].timestamp, Some(1650000000));
        assert!(embeds[1].fields.is_empty());
        assert_eq!(embeds[1].url.as_deref(), embeds[0].url.as_deref());
    }

    #[test]
    fn sauce_embed_links_hosts() {
        let sauce = SauceResult {
            index: crate::fetch::saucenao::SauceIndex::Pixiv,
            similarity: 91.0,
            thumbnail: "https://img3.saucenao.com/t.jpg".to_string(),
            urls: vec!["https://www.pixiv.net/artworks/1".to_string()],
            title: None,
            creator: None,
            link: String::new(),
        };
        let embed = sauce_embed(&sauce);
        assert_eq!(embed.author.as_ref().unwrap().name, "No title");
        assert!(embed
            .description
            .as_deref()
            .unwrap()
            .starts_with("[www.pixiv.net]"));
        assert_eq!(embed.footer.as_ref().unwrap().text, "Similarity: 91");
    }
}
