// src/services/reddit.rs

//! Feed access: polling new submissions and posting replies.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Item, RedditConfig, Submission};
use crate::services::headers::HeaderSource;
use crate::utils::http::{check_feed_status, create_feed_client};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const SITE_BASE: &str = "https://www.reddit.com";

/// Renew tokens this long before they expire.
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

/// What the bot needs from the feed.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Newest submissions, newest first.
    async fn fetch_new_items(&self, limit: usize) -> Result<Vec<Item>>;

    /// Reply to a submission or comment; returns the new comment's id.
    async fn post_comment(&self, parent_id: &str, text: &str) -> Result<String>;

    /// Create a text submission in `venue`.
    async fn submit_text(&self, venue: &str, title: &str, text: &str) -> Result<Submission>;

    /// Accounts whose submissions are never archived: the bot itself and its friends.
    async fn ignored_authors(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct LinkData {
    name: String,
    permalink: String,
    url: String,
    subreddit: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    is_self: bool,
    #[serde(default)]
    selftext_html: Option<String>,
}

impl From<LinkData> for Item {
    fn from(data: LinkData) -> Self {
        Self {
            id: data.name,
            permalink: format!("{SITE_BASE}{}", data.permalink),
            url: data.url,
            subreddit: data.subreddit,
            author: data.author,
            is_self: data.is_self,
            selftext_html: data.selftext_html,
        }
    }
}

/// Envelope of `api_type=json` write endpoints.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    json: ApiJson<T>,
}

#[derive(Debug, Deserialize)]
struct ApiJson<T> {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn into_data(self, context: &str) -> Result<T> {
        if !self.json.errors.is_empty() {
            return Err(AppError::api(
                context,
                serde_json::Value::Array(self.json.errors),
            ));
        }
        self.json
            .data
            .ok_or_else(|| AppError::api(context, "response carried no data"))
    }
}

#[derive(Debug, Deserialize)]
struct CommentData {
    things: Vec<Thing<NameData>>,
}

#[derive(Debug, Deserialize)]
struct NameData {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct FriendList {
    data: FriendData,
}

#[derive(Debug, Deserialize)]
struct FriendData {
    children: Vec<NameData>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    data: WikiData,
}

#[derive(Debug, Deserialize)]
struct WikiData {
    content_md: String,
}

struct Token {
    value: String,
    expires_at: Instant,
}

/// reddit API client using a script application's password grant.
pub struct RedditClient {
    client: Client,
    config: RedditConfig,
    token: Mutex<Option<Token>>,
}

impl RedditClient {
    pub fn new(config: RedditConfig) -> Result<Self> {
        let client = create_feed_client(&config)?;
        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    /// Fetch a token now, failing early on bad credentials.
    pub async fn login(&self) -> Result<()> {
        self.access_token().await.map(|_| ())
    }

    async fn access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref() {
            if Instant::now() + TOKEN_MARGIN < current.expires_at {
                return Ok(current.value.clone());
            }
        }

        log::debug!("Requesting access token for {}", self.config.username);
        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await?;
        let body = check_feed_status(response, "access token")?.text().await?;
        let parsed: TokenResponse = serde_json::from_str(&body)?;

        let value = match (parsed.access_token, parsed.error) {
            (Some(value), _) => value,
            (None, error) => {
                return Err(AppError::Auth(
                    error.unwrap_or_else(|| "no access token returned".into()),
                ));
            }
        };
        let lifetime = Duration::from_secs(parsed.expires_in.unwrap_or(3600));
        *token = Some(Token {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let response = match check_feed_status(response, context) {
            Err(e @ AppError::Auth(_)) => {
                // force a fresh token next time
                self.token.lock().await.take();
                return Err(e);
            }
            other => other?,
        };
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.client.get(format!("{API_BASE}{path}")).query(query);
        self.send_json(request, &format!("GET {path}")).await
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: &[(&str, &str)]) -> Result<T> {
        let request = self.client.post(format!("{API_BASE}{path}")).form(form);
        self.send_json(request, &format!("POST {path}")).await
    }
}

#[async_trait]
impl FeedClient for RedditClient {
    async fn fetch_new_items(&self, limit: usize) -> Result<Vec<Item>> {
        let listing: Listing<LinkData> = self
            .get_json("/r/all/new", &[("limit", limit.to_string())])
            .await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|thing| Item::from(thing.data))
            .collect())
    }

    async fn post_comment(&self, parent_id: &str, text: &str) -> Result<String> {
        let response: ApiResponse<CommentData> = self
            .post_form(
                "/api/comment",
                &[("api_type", "json"), ("thing_id", parent_id), ("text", text)],
            )
            .await?;
        let data = response.into_data("comment")?;
        data.things
            .into_iter()
            .next()
            .map(|thing| thing.data.name)
            .ok_or_else(|| AppError::api("comment", "no comment returned"))
    }

    async fn submit_text(&self, venue: &str, title: &str, text: &str) -> Result<Submission> {
        let response: ApiResponse<SubmitData> = self
            .post_form(
                "/api/submit",
                &[
                    ("api_type", "json"),
                    ("kind", "self"),
                    ("sr", venue),
                    ("title", title),
                    ("text", text),
                ],
            )
            .await?;
        let data = response.into_data("submit")?;
        Ok(Submission {
            id: data.name,
            url: data.url,
        })
    }

    async fn ignored_authors(&self) -> Result<Vec<String>> {
        let me: NameData = self.get_json("/api/v1/me", &[]).await?;
        let friends: FriendList = self.get_json("/api/v1/me/friends", &[]).await?;

        let mut names = vec![me.name];
        names.extend(friends.data.children.into_iter().map(|f| f.name));
        Ok(names)
    }
}

#[async_trait]
impl HeaderSource for RedditClient {
    async fn fetch_header(&self, scope: &str) -> Result<Option<String>> {
        let path = format!("/r/{}/wiki/extxt/{}", self.config.settings_wiki, scope);
        match self.get_json::<WikiPage>(&path, &[]).await {
            Ok(page) => Ok(Some(page.data.content_md)),
            Err(AppError::Feed { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
