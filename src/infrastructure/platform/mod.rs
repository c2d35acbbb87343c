//! 포럼 플랫폼 HTTP 클라이언트.
//! API 응답 상태를 포트의 오류 분류(RateLimited/Forbidden/Api)로 옮긴다.

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::application::config::Config;
use crate::application::ports::{PlatformError, PlatformGateway};
use crate::domain::item::{ChildReply, InboxItem, ItemKind, Thread};
use crate::infrastructure::config::resolve_platform_token;

/// 429 응답에 Retry-After가 없을 때 기다리는 기본 시간(초).
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

pub struct ForumClient {
    client: Client,
    api_base: String,
    token: String,
    user_agent: String,
}

impl ForumClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let Some(api_base) = config.platform.api_base.clone() else {
            bail!("platform.api_base is not configured");
        };

        Ok(Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: resolve_platform_token(config)?,
            user_agent: config.user_agent(),
        })
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("User-Agent", &self.user_agent)
            .bearer_auth(&self.token)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<String, PlatformError> {
        let response = self
            .request(builder)
            .send()
            .await
            .map_err(|err| PlatformError::Api(err.to_string()))?;
        check(response).await
    }
}

/// 상태 코드를 포트 오류로 분류하고, 성공이면 본문을 돌려준다.
async fn check(response: Response) -> Result<String, PlatformError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(PlatformError::RateLimited {
            retry_after_secs: retry_after_secs(&response),
        });
    }
    if status == StatusCode::FORBIDDEN {
        return Err(PlatformError::Forbidden);
    }

    let body = response
        .text()
        .await
        .map_err(|err| PlatformError::Api(err.to_string()))?;
    if !status.is_success() {
        return Err(PlatformError::Api(format!("{status}: {body}")));
    }
    Ok(body)
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get("Retry-After")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, PlatformError> {
    serde_json::from_str(body)
        .map_err(|err| PlatformError::Api(format!("unexpected response shape: {err}")))
}

#[derive(Debug, Deserialize)]
struct ItemDto {
    id: String,
    author: Option<String>,
    body: String,
    kind: String,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    group: Option<String>,
}

impl ItemDto {
    fn into_domain(self) -> InboxItem {
        let kind = if self.kind == "comment" {
            ItemKind::Comment {
                permalink: self.permalink.unwrap_or_default(),
                group: self.group.unwrap_or_default(),
            }
        } else {
            ItemKind::Message
        };
        InboxItem {
            id: self.id,
            author: self.author,
            body: self.body,
            kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ThreadDto {
    item: ItemDto,
    #[serde(default)]
    children: Vec<ChildDto>,
}

#[derive(Debug, Deserialize)]
struct ChildDto {
    id: String,
    author: String,
}

#[async_trait]
impl PlatformGateway for ForumClient {
    async fn fetch_unread(&self) -> Result<Vec<InboxItem>, PlatformError> {
        let url = format!("{}/inbox/unread", self.api_base);
        let body = self.send(self.client.get(&url)).await?;
        let items: Vec<ItemDto> = parse(&body)?;
        Ok(items.into_iter().map(ItemDto::into_domain).collect())
    }

    async fn reply(&self, item_id: &str, text: &str) -> Result<(), PlatformError> {
        let url = format!("{}/items/{}/replies", self.api_base, item_id);
        self.send(self.client.post(&url).json(&json!({ "text": text })))
            .await?;
        Ok(())
    }

    async fn edit(&self, comment_id: &str, text: &str) -> Result<(), PlatformError> {
        let url = format!("{}/comments/{}", self.api_base, comment_id);
        self.send(self.client.patch(&url).json(&json!({ "text": text })))
            .await?;
        Ok(())
    }

    async fn send_message(
        &self,
        user: &str,
        subject: &str,
        text: &str,
    ) -> Result<(), PlatformError> {
        let url = format!("{}/messages", self.api_base);
        self.send(self.client.post(&url).json(&json!({
            "to": user,
            "subject": subject,
            "text": text,
        })))
        .await?;
        Ok(())
    }

    async fn banned_users(&self, group: &str) -> Result<Vec<String>, PlatformError> {
        let url = format!("{}/groups/{}/banned", self.api_base, group);
        let body = self.send(self.client.get(&url)).await?;
        parse(&body)
    }

    async fn fetch_thread(&self, path: &str) -> Result<Option<Thread>, PlatformError> {
        let url = format!("{}/comments/by-path", self.api_base);
        let response = self
            .request(self.client.get(&url).query(&[("path", path)]))
            .send()
            .await
            .map_err(|err| PlatformError::Api(err.to_string()))?;

        // 존재하지 않는 경로는 오류가 아니라 "없음"이다.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = check(response).await?;
        let thread: ThreadDto = parse(&body)?;
        Ok(Some(Thread {
            item: thread.item.into_domain(),
            children: thread
                .children
                .into_iter()
                .map(|child| ChildReply {
                    id: child.id,
                    author: child.author,
                })
                .collect(),
        }))
    }

    async fn mark_read(&self, item_id: &str) -> Result<(), PlatformError> {
        let url = format!("{}/inbox/read/{}", self.api_base, item_id);
        self.send(self.client.post(&url)).await?;
        Ok(())
    }
}
