//! 회신 값 객체.
//! 공개 댓글로 나가는 `CompiledReply`와 쪽지로만 나가는 `MessageReply`를
//! 태그된 합 타입으로 묶는다. 전달 방식 분기는 디스패처가 담당한다.

use crate::domain::format::truncate_with_marker;
use crate::domain::item::InboxItem;
use crate::domain::submission::SubmissionResult;

/// 플랫폼이 허용하는 메시지 최대 길이.
pub const REPLY_HARD_LIMIT: usize = 10_000;

/// 하나의 분류 결과에 대응하는 단 하나의 회신.
#[derive(Debug, Clone)]
pub enum Reply {
    Compiled(CompiledReply),
    Message(MessageReply),
}

/// 원 항목에 공개 댓글로 게시(또는 재컴파일 시 수정)되는 회신.
#[derive(Debug, Clone)]
pub struct CompiledReply {
    pub text: String,
    pub result: SubmissionResult,
    pub origin: InboxItem,
}

impl CompiledReply {
    pub fn new(text: String, result: SubmissionResult, origin: InboxItem) -> Self {
        Self {
            text: cap_length(text),
            result,
            origin,
        }
    }
}

/// 쪽지로만 전달되는 회신. 제목이 없으면 디스패처가 원 항목 기준으로 만든다.
#[derive(Debug, Clone)]
pub struct MessageReply {
    pub text: String,
    pub subject: Option<String>,
}

impl MessageReply {
    pub fn new(text: String) -> Self {
        Self {
            text: cap_length(text),
            subject: None,
        }
    }

    pub fn with_subject(text: String, subject: impl Into<String>) -> Self {
        Self {
            text: cap_length(text),
            subject: Some(subject.into()),
        }
    }
}

/// 하드 한도를 넘는 본문은 생성 시점에 말줄임 표시와 함께 잘라 둔다.
fn cap_length(text: String) -> String {
    if text.len() < REPLY_HARD_LIMIT {
        return text;
    }
    truncate_with_marker(&text, REPLY_HARD_LIMIT - 2)
}
