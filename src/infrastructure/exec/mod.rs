//! 샌드박스 실행 서비스 HTTP 클라이언트.
//! 제출 생성 후 완료 상태가 될 때까지 설정된 간격으로 폴링한다.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tokio::time::sleep;
use tracing::debug;

use crate::application::config::Config;
use crate::application::ports::{ExecError, ExecutionService};
use crate::domain::submission::{ResultCode, SubmissionResult};
use crate::infrastructure::config::resolve_sandbox_key;

pub struct SandboxClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    poll_interval: Duration,
    user_agent: String,
}

impl SandboxClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let Some(api_base) = config.sandbox.api_base.clone() else {
            bail!("sandbox.api_base is not configured");
        };

        Ok(Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: resolve_sandbox_key(config),
            poll_interval: Duration::from_secs(config.poll_interval_secs()),
            user_agent: config.user_agent(),
        })
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        // 공통 헤더/인증 적용.
        let builder = builder.header("User-Agent", &self.user_agent);
        if let Some(key) = &self.api_key {
            builder.bearer_auth(key)
        } else {
            builder
        }
    }

    async fn create(&self, source: &str, language: &str, stdin: &str) -> Result<String, ExecError> {
        let url = format!("{}/submissions", self.api_base);
        let response = self
            .request(self.client.post(&url))
            .json(&json!({
                "source": source,
                "language": language,
                "input": stdin,
            }))
            .send()
            .await
            .context("failed to reach the sandbox service")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read the sandbox response body")?;

        if !status.is_success() {
            // 언어 거부 응답은 유사 언어 목록을 함께 실어 온다.
            if let Ok(refusal) = serde_json::from_str::<CreateRefusal>(&body)
                && refusal.error.to_lowercase().contains("language")
            {
                return Err(ExecError::UnrecognizedLanguage {
                    language: language.to_string(),
                    similar: refusal.similar,
                });
            }
            return Err(anyhow::anyhow!("submission creation failed ({status}): {body}").into());
        }

        let created: CreateResponse =
            serde_json::from_str(&body).context("unexpected submission creation response")?;
        Ok(created.id)
    }

    async fn fetch(&self, id: &str) -> Result<DetailResponse> {
        let url = format!("{}/submissions/{}", self.api_base, id);
        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .context("failed to reach the sandbox service")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read the sandbox response body")?;
        if !status.is_success() {
            bail!("submission lookup failed ({status}): {body}");
        }

        serde_json::from_str(&body).context("unexpected submission detail response")
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreateRefusal {
    error: String,
    #[serde(default)]
    similar: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    status: String,
    #[serde(default)]
    result: Option<i64>,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    compiler_info: String,
    #[serde(default)]
    time_secs: f64,
    #[serde(default)]
    memory_bytes: u64,
    #[serde(default)]
    submitted_at: String,
    #[serde(default)]
    language_version: String,
    #[serde(default)]
    url: String,
}

#[async_trait]
impl ExecutionService for SandboxClient {
    async fn submit(
        &self,
        source: &str,
        language: &str,
        stdin: &str,
    ) -> Result<SubmissionResult, ExecError> {
        let id = self.create(source, language, stdin).await?;
        debug!(id, language, "submission created; polling for completion");

        loop {
            let detail = self.fetch(&id).await?;
            if detail.status == "completed" {
                return Ok(into_result(detail, source, stdin));
            }
            debug!(id, status = %detail.status, "submission still running");
            sleep(self.poll_interval).await;
        }
    }
}

fn into_result(detail: DetailResponse, source: &str, stdin: &str) -> SubmissionResult {
    SubmissionResult {
        source: source.to_string(),
        stdin: stdin.to_string(),
        stdout: detail.stdout,
        stderr: detail.stderr,
        compiler_info: detail.compiler_info,
        code: map_result_code(detail.result.unwrap_or(20)),
        time_secs: detail.time_secs,
        memory_bytes: detail.memory_bytes,
        submitted_at: detail.submitted_at,
        language_version: detail.language_version,
        link: detail.url,
    }
}

/// 서비스의 숫자 결과 코드를 도메인 결과 코드로 바꾼다. 모르는 코드는
/// 내부 오류로 다룬다.
fn map_result_code(code: i64) -> ResultCode {
    match code {
        15 => ResultCode::Success,
        11 => ResultCode::CompileError,
        12 => ResultCode::RuntimeError,
        13 => ResultCode::Timeout,
        17 => ResultCode::MemoryError,
        19 => ResultCode::IllegalOperation,
        _ => ResultCode::InternalError,
    }
}
