//! 애플리케이션 계층이 의존하는 포트(추상 인터페이스) 모음.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::item::{InboxItem, Thread};
use crate::domain::submission::SubmissionResult;

/// 실행 서비스 호출 실패.
#[derive(Debug, Error)]
pub enum ExecError {
    /// 서비스가 언어명을 거부하면서 유사한 이름 목록을 함께 돌려준 경우.
    #[error("language '{language}' was not recognized")]
    UnrecognizedLanguage {
        language: String,
        similar: Vec<String>,
    },
    /// 그 밖의 서비스/전송 오류. 호출자 쪽에서 예기치 못한 오류로 다룬다.
    #[error(transparent)]
    Service(#[from] anyhow::Error),
}

/// 플랫폼 API 호출 실패. 디스패처의 재시도 정책이 이 분류를 따른다.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// 속도 제한. 응답이 지정한 시간만큼 기다린 뒤 재시도한다.
    #[error("rate limited; retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    /// 접근 금지. 대상이 차단/삭제된 것으로 보고 재시도하지 않는다.
    #[error("access to the delivery target is forbidden")]
    Forbidden,
    /// 일반 API 오류. 증가하는 대기 시간으로 재시도한다.
    #[error("platform API error: {0}")]
    Api(String),
}

/// 원격 코드 실행 서비스 경계.
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// 제출을 생성하고 완료될 때까지 폴링해 결과를 돌려준다.
    /// 호출은 블로킹 왕복이며 파이프라인 전체가 이 결과를 기다린다.
    async fn submit(
        &self,
        source: &str,
        language: &str,
        stdin: &str,
    ) -> Result<SubmissionResult, ExecError>;
}

/// 포럼 플랫폼 경계.
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    async fn fetch_unread(&self) -> Result<Vec<InboxItem>, PlatformError>;
    /// 항목에 공개 답글을 단다.
    async fn reply(&self, item_id: &str, text: &str) -> Result<(), PlatformError>;
    /// 봇이 쓴 기존 댓글 본문을 교체한다.
    async fn edit(&self, comment_id: &str, text: &str) -> Result<(), PlatformError>;
    async fn send_message(
        &self,
        user: &str,
        subject: &str,
        text: &str,
    ) -> Result<(), PlatformError>;
    /// 그룹의 차단 사용자 목록.
    async fn banned_users(&self, group: &str) -> Result<Vec<String>, PlatformError>;
    /// 스레드 경로로 댓글과 보이는 자식 댓글들을 조회한다. 없으면 `None`.
    async fn fetch_thread(&self, path: &str) -> Result<Option<Thread>, PlatformError>;
    async fn mark_read(&self, item_id: &str) -> Result<(), PlatformError>;
}
