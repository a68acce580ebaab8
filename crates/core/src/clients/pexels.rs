use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

use crate::{
    clients::{FootageFile, FootageSearch, FootageVideo, check_status, http_client},
    config::{FootageConfig, Settings, require_key},
    error::{ReelError, Result},
    stages::stage_ids,
};

const SEARCH_URL: &str = "https://api.pexels.com/videos/search";
const SERVICE: &str = "Pexels";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    id: u64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    video_files: Vec<PexelsFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsFile {
    link: String,
    width: Option<u32>,
    height: Option<u32>,
    file_type: Option<String>,
}

impl From<PexelsVideo> for FootageVideo {
    fn from(video: PexelsVideo) -> Self {
        FootageVideo {
            id: video.id,
            page_url: video.url,
            files: video
                .video_files
                .into_iter()
                .map(|f| FootageFile {
                    link: f.link,
                    width: f.width.unwrap_or(0),
                    height: f.height.unwrap_or(0),
                    file_type: f.file_type.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

fn parse_search(body: &str) -> Result<Vec<FootageVideo>> {
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|e| ReelError::parse("Pexels search response", e))?;
    Ok(parsed.videos.into_iter().map(FootageVideo::from).collect())
}

pub struct PexelsClient {
    http: reqwest::Client,
    api_key: Option<String>,
    per_page: u32,
}

impl PexelsClient {
    pub fn new(api_key: Option<String>, config: &FootageConfig) -> Self {
        Self {
            http: http_client(),
            api_key,
            per_page: config.per_page,
        }
    }

    pub fn from_settings(settings: &Settings, config: &FootageConfig) -> Self {
        Self::new(settings.pexels_key.clone(), config)
    }
}

#[async_trait]
impl FootageSearch for PexelsClient {
    async fn search(&self, query: &str) -> Result<Vec<FootageVideo>> {
        let api_key = require_key(
            self.api_key.as_deref(),
            Settings::PEXELS_KEY,
            stage_ids::FOOTAGE,
        )?;

        debug!(query, "searching footage");
        let response = self
            .http
            .get(SEARCH_URL)
            .header("Authorization", api_key)
            .query(&[
                ("query", query),
                ("orientation", "landscape"),
                ("per_page", self.per_page.to_string().as_str()),
            ])
            .send()
            .await
            .map_err(|e| ReelError::service(SERVICE, e))?;

        let response = check_status(SERVICE, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ReelError::service(SERVICE, e))?;

        parse_search(&body)
    }

    async fn download(&self, link: &str, dest: &Path) -> Result<()> {
        debug!(link, dest = %dest.display(), "downloading clip");
        let response = self
            .http
            .get(link)
            .send()
            .await
            .map_err(|e| ReelError::service(SERVICE, e))?;
        let response = check_status(SERVICE, response).await?;

        let mut file = fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ReelError::service(SERVICE, e))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}
