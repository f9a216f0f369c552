//! Pixiv ajax + media CDN client, including the ugoira transcode pipeline.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::errors::Error;
use crate::payload::Attachment;
use crate::Result;

const AJAX_BASE: &str = "https://www.pixiv.net/ajax/illust";
const REFERER: &str = "https://www.pixiv.net/";
const USER_AGENT: &str = "Mozilla/5.0";

/// `illustType` value marking an animated frame-sequence artwork.
const UGOIRA_TYPE: u8 = 2;

#[derive(Debug, Deserialize)]
struct AjaxEnvelope<T> {
    error: bool,
    #[serde(default)]
    message: String,
    body: Option<T>,
}

/// Illustration metadata from `/ajax/illust/{id}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IllustMeta {
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub user_name: String,
    /// RFC 3339 creation time, as sent by the API.
    pub create_date: String,
    pub page_count: u32,
    pub illust_type: u8,
    pub urls: IllustUrls,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub bookmark_count: u64,
    #[serde(default)]
    pub view_count: u64,
}

impl IllustMeta {
    /// Creation time as unix seconds, when the API timestamp parses.
    pub fn created_at(&self) -> Option<i64> {
        chrono::DateTime::parse_from_rfc3339(&self.create_date)
            .ok()
            .map(|t| t.timestamp())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct IllustUrls {
    pub original: String,
}

/// A fetched artwork, discriminated by upstream illust type.
#[derive(Clone, Debug)]
pub enum Artwork {
    Illust(IllustMeta),
    Ugoira(IllustMeta, UgoiraMeta),
}

/// Frame archive location + timing manifest from `/ajax/illust/{id}/ugoira_meta`.
#[derive(Clone, Debug, Deserialize)]
pub struct UgoiraMeta {
    #[serde(rename = "originalSrc")]
    pub original_src: String,
    #[serde(rename = "mime_type")]
    pub mime_type: String,
    pub frames: Vec<UgoiraFrame>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UgoiraFrame {
    pub file: String,
    /// Display duration in milliseconds.
    pub delay: u64,
}

#[derive(Clone)]
pub struct PixivClient {
    http: reqwest::Client,
    session: String,
    user_id: Option<String>,
}

impl PixivClient {
    pub fn new(http: reqwest::Client, session: String, user_id: Option<String>) -> Self {
        Self {
            http,
            session,
            user_id,
        }
    }

    /// Fetch artwork metadata; ugoira additionally pulls the frame manifest.
    pub async fn get_artwork(&self, id: &str) -> Result<Artwork> {
        let meta: IllustMeta = self.ajax(&format!("{AJAX_BASE}/{id}")).await?;
        if meta.illust_type == UGOIRA_TYPE {
            let frames: UgoiraMeta = self.ajax(&format!("{AJAX_BASE}/{id}/ugoira_meta")).await?;
            Ok(Artwork::Ugoira(meta, frames))
        } else {
            Ok(Artwork::Illust(meta))
        }
    }

    async fn ajax<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut req = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(
                reqwest::header::COOKIE,
                format!("PHPSESSID={}", self.session),
            );
        if let Some(user_id) = &self.user_id {
            req = req.header("x-user-id", user_id);
        }

        let envelope: AjaxEnvelope<T> = req.send().await?.error_for_status()?.json().await?;
        if envelope.error {
            return Err(Error::upstream("pixiv", envelope.message));
        }
        envelope
            .body
            .ok_or_else(|| Error::upstream("pixiv", "response body missing"))
    }

    /// Fetch one media file from the CDN. The Referer header is required or
    /// the CDN answers 403.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let res = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::REFERER, REFERER)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.bytes().await?.to_vec())
    }
}

/// Derive the page-`index` URL from the `_p0` original URL.
pub fn page_url(original: &str, index: u32) -> String {
    let Some(sep) = original.rfind('_') else {
        return original.to_string();
    };
    let ext = original.rfind('.').map(|i| &original[i..]).unwrap_or("");
    format!("{}_p{index}{ext}", &original[..sep])
}

/// Per-page original URLs for a static illust, in page order.
pub fn page_urls(meta: &IllustMeta) -> impl Iterator<Item = String> + '_ {
    (0..meta.page_count).map(|i| page_url(&meta.urls.original, i))
}

/// Last path segment of a media URL, used as the attachment filename.
pub fn file_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Download, unpack and transcode an ugoira into an mp4 attachment.
///
/// The per-job directory under the system temp dir is removed best-effort
/// whether the pipeline succeeds or fails.
pub async fn transcode_ugoira(
    client: &PixivClient,
    id: &str,
    meta: &UgoiraMeta,
    ffmpeg: &Path,
) -> Result<Attachment> {
    let workdir = std::env::temp_dir().join(format!("saucery-ugoira-{id}"));
    tokio::fs::create_dir_all(&workdir).await?;

    let result = run_transcode(client, id, meta, ffmpeg, &workdir).await;

    if let Err(err) = tokio::fs::remove_dir_all(&workdir).await {
        tracing::debug!("ugoira workdir cleanup failed: {err}");
    }

    result
}

async fn run_transcode(
    client: &PixivClient,
    id: &str,
    meta: &UgoiraMeta,
    ffmpeg: &Path,
    workdir: &Path,
) -> Result<Attachment> {
    let archive = client.download(&meta.original_src).await?;
    extract_frames(&archive, workdir)?;

    let manifest = workdir.join("frames.txt");
    tokio::fs::write(&manifest, concat_manifest(&meta.frames)).await?;

    let out = workdir.join(format!("{id}.mp4"));
    let output = tokio::process::Command::new(ffmpeg)
        .arg("-y")
        .args(["-f", "concat", "-safe", "0"])
        .arg("-i")
        .arg(&manifest)
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
        .arg(&out)
        .current_dir(workdir)
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::Transcode(
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ));
    }

    let bytes = tokio::fs::read(&out).await?;
    Ok(Attachment::new(format!("{id}.mp4"), bytes))
}

fn extract_frames(archive: &[u8], workdir: &Path) -> Result<()> {
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive))
        .map_err(|e| Error::Transcode(format!("bad frame archive: {e}")))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| Error::Transcode(format!("bad frame archive: {e}")))?;
        // Frames are flat files; anything that resolves outside is dropped.
        let Some(name) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            continue;
        };
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        std::fs::write(workdir.join(name), bytes)?;
    }

    Ok(())
}

/// ffmpeg concat demuxer manifest. The final frame is listed a second time
/// because the demuxer ignores the trailing duration otherwise.
pub fn concat_manifest(frames: &[UgoiraFrame]) -> String {
    let mut out = String::new();
    for frame in frames {
        out.push_str(&format!(
            "file '{}'\nduration {:.3}\n",
            frame.file,
            frame.delay as f64 / 1000.0
        ));
    }
    if let Some(last) = frames.last() {
        out.push_str(&format!("file '{}'\n", last.file));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_substitutes_index() {
        let original = "https://i.pximg.net/img-original/img/2022/01/01/00/00/00/95932201_p0.png";
        assert_eq!(
            page_url(original, 3),
            "https://i.pximg.net/img-original/img/2022/01/01/00/00/00/95932201_p3.png"
        );
    }

    #[test]
    fn file_name_takes_last_segment() {
        assert_eq!(file_name("https://x/y/95932201_p0.png"), "95932201_p0.png");
        assert_eq!(file_name("no-slashes"), "no-slashes");
    }

    #[test]
    fn meta_deserializes_from_ajax_shape() {
        let json = r#"{
            "error": false,
            "message": "",
            "body": {
                "id": "97552299",
                "title": "untitled",
                "userId": "123",
                "userName": "someone",
                "createDate": "2022-04-16T00:00:00+09:00",
                "pageCount": 2,
                "illustType": 0,
                "urls": { "original": "https://i.pximg.net/a_p0.png" },
                "likeCount": 10,
                "bookmarkCount": 20,
                "viewCount": 30
            }
        }"#;
        let envelope: AjaxEnvelope<IllustMeta> = serde_json::from_str(json).unwrap();
        let meta = envelope.body.unwrap();
        assert_eq!(meta.page_count, 2);
        assert_eq!(meta.user_name, "someone");
        assert!(meta.created_at().is_some());
    }

    #[test]
    fn ugoira_meta_field_names() {
        let json = r#"{
            "originalSrc": "https://i.pximg.net/img-zip-ugoira/a_ugoira1920x1080.zip",
            "mime_type": "image/jpeg",
            "frames": [
                { "file": "000000.jpg", "delay": 77 },
                { "file": "000001.jpg", "delay": 100 }
            ]
        }"#;
        let meta: UgoiraMeta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.frames.len(), 2);
        assert_eq!(meta.frames[1].delay, 100);
    }

    #[test]
    fn concat_manifest_repeats_last_frame() {
        let frames = vec![
            UgoiraFrame {
                file: "000000.jpg".to_string(),
                delay: 77,
            },
            UgoiraFrame {
                file: "000001.jpg".to_string(),
                delay: 100,
            },
        ];
        let manifest = concat_manifest(&frames);
        assert_eq!(
            manifest,
            "file '000000.jpg'\nduration 0.077\nfile '000001.jpg'\nduration 0.100\nfile '000001.jpg'\n"
        );
    }
}
