use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;

use super::{status_error, timedtext, CaptionProvider, CaptionTrack, ProviderError, TrackListing};
use crate::config::NetworkConfig;
use crate::transcript::TranscriptSegment;
use crate::video::VideoId;

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

/// Client identity sent to the InnerTube player endpoint
const CLIENT_NAME: &str = "ANDROID";
const CLIENT_VERSION: &str = "20.10.38";

/// YouTube caption provider backed by the InnerTube player API
pub struct YoutubeProvider {
    client: Client,
    base_url: String,
    accept_language: String,
}

impl YoutubeProvider {
    pub fn new(config: &NetworkConfig) -> Result<Self, ProviderError> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Create a provider talking to a different host (mirrors, local test servers)
    pub fn with_base_url(config: &NetworkConfig, base_url: &str) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProviderError::Malformed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            accept_language: config.accept_language.clone(),
        })
    }

    /// Fetch the watch page and pull the InnerTube API key out of it
    async fn fetch_api_key(&self, id: &VideoId) -> Result<String, ProviderError> {
        tracing::debug!(video_id = %id, "Fetching watch page");

        let response = self
            .client
            .get(format!("{}/watch", self.base_url))
            .query(&[("v", id.as_str())])
            .header(reqwest::header::ACCEPT_LANGUAGE, self.accept_language.as_str())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response.status(), response.url().to_string()));
        }

        let html = response.text().await?;
        extract_api_key(&html)
    }

    /// Query the player endpoint for playability, title and caption tracks
    async fn fetch_player_response(&self, id: &VideoId, api_key: &str) -> Result<Value, ProviderError> {
        tracing::debug!(video_id = %id, "Querying player endpoint");

        let body = json!({
            "context": {
                "client": {
                    "clientName": CLIENT_NAME,
                    "clientVersion": CLIENT_VERSION,
                }
            },
            "videoId": id.as_str(),
        });

        let response = self
            .client
            .post(format!("{}/youtubei/v1/player", self.base_url))
            .query(&[("key", api_key)])
            .header(reqwest::header::ACCEPT_LANGUAGE, self.accept_language.as_str())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response.status(), response.url().to_string()));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl CaptionProvider for YoutubeProvider {
    async fn list_tracks(&self, id: &VideoId) -> Result<TrackListing, ProviderError> {
        let api_key = self.fetch_api_key(id).await?;
        let player = self.fetch_player_response(id, &api_key).await?;
        parse_player_response(&player)
    }

    async fn download(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSegment>, ProviderError> {
        tracing::debug!(language = %track.language_code, "Downloading caption track");

        let response = self
            .client
            .get(&track.base_url)
            .header(reqwest::header::ACCEPT_LANGUAGE, self.accept_language.as_str())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response.status(), track.base_url.clone()));
        }

        let xml = response.text().await?;
        timedtext::parse_timedtext(&xml)
    }

    fn provider_name(&self) -> &'static str {
        "YouTube"
    }
}

fn api_key_regex() -> &'static Regex {
    static API_KEY: OnceLock<Regex> = OnceLock::new();
    API_KEY.get_or_init(|| {
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("static regex is valid")
    })
}

fn extract_api_key(html: &str) -> Result<String, ProviderError> {
    if let Some(caps) = api_key_regex().captures(html) {
        return Ok(caps[1].to_string());
    }

    if html.contains("class=\"g-recaptcha\"") {
        return Err(ProviderError::Blocked("watch page answered with a reCAPTCHA".to_string()));
    }

    Err(ProviderError::Malformed("watch page did not contain an InnerTube API key".to_string()))
}

/// Interpret an InnerTube player response
fn parse_player_response(player: &Value) -> Result<TrackListing, ProviderError> {
    let playability = &player["playabilityStatus"];
    let status = playability["status"].as_str().unwrap_or("UNKNOWN");

    if status != "OK" {
        let reason = playability["reason"]
            .as_str()
            .unwrap_or("no reason given")
            .to_string();

        if status == "LOGIN_REQUIRED" && reason.contains("not a bot") {
            return Err(ProviderError::Blocked(reason));
        }
        return Err(ProviderError::VideoUnavailable(format!("{} ({})", reason, status)));
    }

    let video_title = player["videoDetails"]["title"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    let caption_tracks = player["captions"]["playerCaptionsTracklistRenderer"]["captionTracks"]
        .as_array()
        .ok_or(ProviderError::TranscriptsDisabled)?;

    let tracks = caption_tracks
        .iter()
        .filter_map(|track| {
            let base_url = track["baseUrl"].as_str()?.replace("&fmt=srv3", "");
            let language_code = track["languageCode"].as_str()?.to_string();
            let language_name = track["name"]["runs"][0]["text"]
                .as_str()
                .or_else(|| track["name"]["simpleText"].as_str())
                .unwrap_or(&language_code)
                .to_string();

            Some(CaptionTrack {
                is_generated: track["kind"].as_str() == Some("asr"),
                language_code,
                language_name,
                base_url,
            })
        })
        .collect();

    Ok(TrackListing { video_title, tracks })
}
