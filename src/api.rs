use serde::{Deserialize, Serialize};

use crate::config::ServerProfile;
use crate::engine::{MediaSource, SourceKind};
use crate::item_id::{deserialize_rating, ItemId};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Category {
    pub category_id: ItemId,
    pub category_name: String,
}

impl Category {
    pub fn new(id: impl Into<ItemId>, name: &str) -> Self {
        Self {
            category_id: id.into(),
            category_name: name.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Channel {
    pub stream_id: ItemId,
    pub name: String,
    #[serde(default)]
    pub category_id: Option<ItemId>,
    #[serde(default)]
    pub stream_icon: Option<String>,
    #[serde(default)]
    pub epg_channel_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Movie {
    pub stream_id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category_id: Option<ItemId>,
    #[serde(default)]
    pub stream_icon: Option<String>,
    #[serde(default, deserialize_with = "deserialize_rating")]
    pub rating: Option<f32>,
    #[serde(default)]
    pub container_extension: Option<String>,
}

/// One entry of `get_short_epg`; title and description are base64 encoded
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct EpgListing {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub start_timestamp: Option<serde_json::Value>,
    #[serde(default)]
    pub stop_timestamp: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
struct ShortEpgResponse {
    #[serde(default)]
    epg_listings: Vec<EpgListing>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct VodDetails {
    pub name: Option<String>,
    pub cover_big: Option<String>,
    pub movie_image: Option<String>,
    pub releasedate: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "deserialize_rating")]
    pub rating: Option<f32>,
    pub director: Option<String>,
    pub description: Option<String>,
    pub plot: Option<String>,
    pub container_extension: Option<String>,
    pub tmdb_id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct VodMovieData {
    pub stream_id: Option<ItemId>,
    pub container_extension: Option<String>,
}

/// Response of `get_vod_info`. Every field is optional; providers omit freely.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct VodInfo {
    #[serde(default)]
    pub info: Option<VodDetails>,
    #[serde(default)]
    pub movie_data: Option<VodMovieData>,
}

impl VodInfo {
    /// Container extension without the leading dot, if the provider named one
    pub fn container_extension(&self) -> Option<String> {
        self.info
            .as_ref()
            .and_then(|i| i.container_extension.clone())
            .or_else(|| self.movie_data.as_ref().and_then(|m| m.container_extension.clone()))
            .map(|ext| ext.trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
    }

    pub fn synopsis(&self) -> Option<&str> {
        let info = self.info.as_ref()?;
        info.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(info.plot.as_deref())
    }

    pub fn year(&self) -> Option<&str> {
        let date = self.info.as_ref()?.releasedate.as_deref()?;
        date.get(..4)
    }
}

#[derive(Debug, Clone)]
pub struct XtreamClient {
    pub base_url: String,
    pub username: String,
    pub password: String,
    client: reqwest::Client,
}

impl XtreamClient {
    pub fn new(profile: &ServerProfile) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("IPTV Smarters Pro")
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: profile.base_url(),
            username: profile.username.clone(),
            password: profile.password.clone(),
            client,
        }
    }

    fn api_url(&self, action: &str) -> String {
        format!(
            "{}/player_api.php?username={}&password={}&action={}",
            self.base_url, self.username, self.password, action
        )
    }

    pub async fn get_live_categories(&self) -> Result<Vec<Category>, anyhow::Error> {
        let resp = self.client.get(self.api_url("get_live_categories")).send().await?;
        let categories: Vec<Category> = resp.json().await?;
        Ok(categories)
    }

    pub async fn get_live_streams(&self) -> Result<Vec<Channel>, anyhow::Error> {
        let resp = self.client.get(self.api_url("get_live_streams")).send().await?;
        let channels: Vec<Channel> = resp.json().await?;
        Ok(channels)
    }

    pub async fn get_vod_categories(&self) -> Result<Vec<Category>, anyhow::Error> {
        let resp = self.client.get(self.api_url("get_vod_categories")).send().await?;
        let categories: Vec<Category> = resp.json().await?;
        Ok(categories)
    }

    pub async fn get_vod_streams(&self) -> Result<Vec<Movie>, anyhow::Error> {
        let resp = self.client.get(self.api_url("get_vod_streams")).send().await?;
        let movies: Vec<Movie> = resp.json().await?;
        Ok(movies)
    }

    pub async fn get_short_epg(
        &self,
        stream_id: &ItemId,
        limit: usize,
    ) -> Result<Vec<EpgListing>, anyhow::Error> {
        let url = format!(
            "{}&stream_id={}&limit={}",
            self.api_url("get_short_epg"),
            stream_id,
            limit
        );
        let resp = self.client.get(&url).send().await?;
        let body: ShortEpgResponse = resp.json().await?;
        Ok(body.epg_listings)
    }

    pub async fn get_vod_info(&self, vod_id: &ItemId) -> Result<VodInfo, anyhow::Error> {
        let url = format!("{}&vod_id={}", self.api_url("get_vod_info"), vod_id);
        let resp = self.client.get(&url).send().await?;
        let info: VodInfo = resp.json().await?;
        Ok(info)
    }

    /// Live channels are always delivered as HLS
    pub fn live_source(&self, channel: &Channel) -> MediaSource {
        MediaSource::new(
            format!(
                "{}/live/{}/{}/{}.m3u8",
                self.base_url, self.username, self.password, channel.stream_id
            ),
            SourceKind::Segmented,
        )
    }

    /// Container from metadata first, then the listing, then mp4
    pub fn vod_source(&self, movie: &Movie, info: Option<&VodInfo>) -> MediaSource {
        let ext = info
            .and_then(|i| i.container_extension())
            .or_else(|| {
                movie
                    .container_extension
                    .as_ref()
                    .map(|e| e.trim_start_matches('.').to_string())
                    .filter(|e| !e.is_empty())
            })
            .unwrap_or_else(|| "mp4".to_string());
        let url = format!(
            "{}/movie/{}/{}/{}.{}",
            self.base_url, self.username, self.password, movie.stream_id, ext
        );
        MediaSource::from_url(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> XtreamClient {
        XtreamClient::new(&ServerProfile {
            protocol: "http".into(),
            host: "tv.local".into(),
            port: Some(8080),
            username: "user".into(),
            password: "pass".into(),
        })
    }

    #[test]
    fn channel_accepts_string_and_number_ids() {
        let json = r#"[{"stream_id":10,"name":"News","category_id":"3"},
                       {"stream_id":"20","name":"Sport","category_id":null}]"#;
        let channels: Vec<Channel> = serde_json::from_str(json).unwrap();
        assert_eq!(channels[0].stream_id, ItemId::Number(10));
        assert_eq!(channels[0].category_id, Some(ItemId::Number(3)));
        assert_eq!(channels[1].stream_id, ItemId::Number(20));
        assert_eq!(channels[1].category_id, None);
    }

    #[test]
    fn live_source_is_segmented() {
        let ch = Channel {
            stream_id: ItemId::Number(10),
            name: "News".into(),
            ..Default::default()
        };
        let src = client().live_source(&ch);
        assert_eq!(src.url, "http://tv.local:8080/live/user/pass/10.m3u8");
        assert_eq!(src.kind, SourceKind::Segmented);
    }

    #[test]
    fn vod_source_prefers_metadata_extension() {
        let movie = Movie {
            stream_id: ItemId::Number(7),
            container_extension: Some("avi".into()),
            ..Default::default()
        };
        let info: VodInfo =
            serde_json::from_str(r#"{"info":{"container_extension":".mkv"}}"#).unwrap();

        let with_info = client().vod_source(&movie, Some(&info));
        assert!(with_info.url.ends_with("/movie/user/pass/7.mkv"));
        assert_eq!(with_info.kind, SourceKind::Progressive);

        let without = client().vod_source(&movie, None);
        assert!(without.url.ends_with("7.avi"));

        let bare = client().vod_source(&Movie::default(), None);
        assert!(bare.url.ends_with("0.mp4"));
    }

    #[test]
    fn vod_info_tolerates_sparse_payload() {
        let info: VodInfo = serde_json::from_str(
            r#"{"info":{"name":"Heat","releasedate":"1995-12-15","plot":"LA crime","rating":"8.3"}}"#,
        )
        .unwrap();
        assert_eq!(info.year(), Some("1995"));
        assert_eq!(info.synopsis(), Some("LA crime"));
        assert_eq!(info.info.as_ref().and_then(|i| i.rating), Some(8.3));
        assert_eq!(info.container_extension(), None);
    }
}
