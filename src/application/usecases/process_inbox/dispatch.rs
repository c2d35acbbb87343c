//! 회신 전달 단계.
//! 변형별 전달 경로(댓글 게시 / 기존 댓글 수정 / 쪽지)와 재시도 정책을 맡는다.

use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::application::config::Config;
use crate::application::ports::{PlatformError, PlatformGateway};
use crate::domain::item::{ChildReply, InboxItem};
use crate::domain::reply::Reply;

/// 전달 결과. 호출자는 Posted/Edited일 때만 스팸 검사를 이어 간다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Delivery {
    Posted,
    Edited { comment_id: String },
    Messaged,
    /// 수신자를 특정할 수 없어 기록만 남기고 버린 경우.
    Skipped,
    /// 전달 대상 접근이 금지되어 재시도 없이 포기한 경우.
    Forbidden,
}

/// 전달에 필요한 원 항목과 재컴파일 맥락.
pub(super) struct DeliveryContext<'a> {
    pub origin: &'a InboxItem,
    /// 재컴파일 흐름에서만 설정된다. 수정 공지의 요청자 표기에 쓰인다.
    pub recompile_requester: Option<&'a str>,
    /// 기존 봇 댓글을 찾아볼 자식 댓글 목록.
    pub edit_candidates: &'a [ChildReply],
}

impl<'a> DeliveryContext<'a> {
    pub fn plain(origin: &'a InboxItem) -> Self {
        Self {
            origin,
            recompile_requester: None,
            edit_candidates: &[],
        }
    }
}

pub(super) struct Dispatcher<'a> {
    pub platform: &'a dyn PlatformGateway,
    pub config: &'a Config,
}

impl Dispatcher<'_> {
    /// 일시적 오류는 한도 내에서 재시도하고, 금지 오류는 즉시 포기한다.
    /// 재시도를 소진하면 마지막 오류를 그대로 호출자에게 넘긴다.
    pub async fn deliver(
        &self,
        reply: &Reply,
        ctx: &DeliveryContext<'_>,
    ) -> Result<Delivery, PlatformError> {
        let max_attempts = self.config.max_attempts().max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.attempt(reply, ctx).await {
                Ok(delivery) => return Ok(delivery),
                Err(PlatformError::Forbidden) => {
                    warn!(item = %ctx.origin.id, "delivery target is forbidden; giving up");
                    return Ok(Delivery::Forbidden);
                }
                Err(err) if attempt >= max_attempts => return Err(err),
                Err(PlatformError::RateLimited { retry_after_secs }) => {
                    warn!(attempt, retry_after_secs, "rate limited; waiting before retry");
                    sleep(Duration::from_secs(retry_after_secs)).await;
                }
                Err(err) => {
                    // 일반 오류는 시도 횟수에 비례해 더 오래 기다린다.
                    let delay = self.config.backoff_secs() * u64::from(attempt);
                    warn!(attempt, delay_secs = delay, error = %err, "platform error; retrying");
                    sleep(Duration::from_secs(delay)).await;
                }
            }
        }
    }

    async fn attempt(
        &self,
        reply: &Reply,
        ctx: &DeliveryContext<'_>,
    ) -> Result<Delivery, PlatformError> {
        match reply {
            Reply::Compiled(compiled) => {
                if let Some(requester) = ctx.recompile_requester
                    && let Some(existing) = self.find_bot_reply(ctx.edit_candidates)
                {
                    let notice = self.config.recompile_notice().replace("{requester}", requester);
                    let text = format!("{}\n\n{}", compiled.text, notice);
                    self.platform.edit(&existing.id, &text).await?;
                    return Ok(Delivery::Edited {
                        comment_id: existing.id.clone(),
                    });
                }

                self.platform.reply(&ctx.origin.id, &compiled.text).await?;
                Ok(Delivery::Posted)
            }
            Reply::Message(message) => {
                let Some(recipient) = ctx.origin.author.as_deref() else {
                    // 원 항목의 작성자를 알 수 없으면 회신 채널이 없다.
                    warn!(item = %ctx.origin.id, "no recipient for message reply; dropping");
                    return Ok(Delivery::Skipped);
                };

                let subject = match &message.subject {
                    Some(subject) => subject.clone(),
                    None => format!("{}: re {}", self.config.handle(), ctx.origin.id),
                };
                self.platform
                    .send_message(recipient, &subject, &message.text)
                    .await?;
                Ok(Delivery::Messaged)
            }
        }
    }

    /// 자식 댓글 중 봇이 쓴 첫 번째 것만 수정 대상으로 삼는다.
    fn find_bot_reply<'a>(&self, candidates: &'a [ChildReply]) -> Option<&'a ChildReply> {
        let handle = self.config.handle();
        candidates
            .iter()
            .find(|child| child.author.eq_ignore_ascii_case(&handle))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{MockPlatform, comment, result_with_code};
    use super::*;
    use crate::domain::item::ItemKind;
    use crate::domain::reply::{CompiledReply, MessageReply};
    use crate::domain::submission::ResultCode;

    fn compiled(origin: &InboxItem) -> Reply {
        Reply::Compiled(CompiledReply::new(
            "Output:\n\n    hi\n".to_string(),
            result_with_code(ResultCode::Success),
            origin.clone(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limits_are_retried_until_success() {
        let platform = MockPlatform::default();
        platform
            .failures
            .lock()
            .unwrap()
            .push_back(PlatformError::RateLimited { retry_after_secs: 7 });
        let config = Config::default();
        let dispatcher = Dispatcher {
            platform: &platform,
            config: &config,
        };
        let origin = comment("c1", "alice", "");

        let delivery = dispatcher
            .deliver(&compiled(&origin), &DeliveryContext::plain(&origin))
            .await
            .unwrap();

        assert_eq!(delivery, Delivery::Posted);
        assert_eq!(platform.replies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn forbidden_gives_up_without_retrying() {
        let platform = MockPlatform::default();
        platform
            .failures
            .lock()
            .unwrap()
            .push_back(PlatformError::Forbidden);
        let config = Config::default();
        let dispatcher = Dispatcher {
            platform: &platform,
            config: &config,
        };
        let origin = comment("c1", "alice", "");

        let delivery = dispatcher
            .deliver(&compiled(&origin), &DeliveryContext::plain(&origin))
            .await
            .unwrap();

        assert_eq!(delivery, Delivery::Forbidden);
        assert!(platform.replies.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_the_last_error() {
        let platform = MockPlatform::default();
        {
            let mut failures = platform.failures.lock().unwrap();
            for _ in 0..3 {
                failures.push_back(PlatformError::Api("boom".to_string()));
            }
        }
        let config = Config::default();
        let dispatcher = Dispatcher {
            platform: &platform,
            config: &config,
        };
        let origin = comment("c1", "alice", "");

        let err = dispatcher
            .deliver(&compiled(&origin), &DeliveryContext::plain(&origin))
            .await
            .unwrap_err();

        assert!(matches!(err, PlatformError::Api(_)));
        assert!(platform.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn message_without_a_recipient_is_skipped() {
        let platform = MockPlatform::default();
        let config = Config::default();
        let dispatcher = Dispatcher {
            platform: &platform,
            config: &config,
        };
        let origin = InboxItem {
            id: "c1".to_string(),
            author: None,
            body: String::new(),
            kind: ItemKind::Message,
        };
        let reply = Reply::Message(MessageReply::new("hello".to_string()));

        let delivery = dispatcher
            .deliver(&reply, &DeliveryContext::plain(&origin))
            .await
            .unwrap();

        assert_eq!(delivery, Delivery::Skipped);
        assert!(platform.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn default_message_subject_names_the_origin_item() {
        let platform = MockPlatform::default();
        let config = Config::default();
        let dispatcher = Dispatcher {
            platform: &platform,
            config: &config,
        };
        let origin = comment("c1", "alice", "");
        let reply = Reply::Message(MessageReply::new("hello".to_string()));

        dispatcher
            .deliver(&reply, &DeliveryContext::plain(&origin))
            .await
            .unwrap();

        let messages = platform.messages.lock().unwrap();
        assert_eq!(messages[0].1, "runpilot: re c1");
    }

    #[tokio::test]
    async fn recompile_context_edits_the_bot_child() {
        let platform = MockPlatform::default();
        let config = Config::default();
        let dispatcher = Dispatcher {
            platform: &platform,
            config: &config,
        };
        let origin = comment("orig", "alice", "");
        let children = vec![
            ChildReply {
                id: "other".to_string(),
                author: "bob".to_string(),
            },
            ChildReply {
                id: "bot1".to_string(),
                author: "RUNPILOT".to_string(),
            },
        ];
        let ctx = DeliveryContext {
            origin: &origin,
            recompile_requester: Some("alice"),
            edit_candidates: &children,
        };

        let delivery = dispatcher.deliver(&compiled(&origin), &ctx).await.unwrap();

        assert_eq!(
            delivery,
            Delivery::Edited {
                comment_id: "bot1".to_string()
            }
        );
        let edits = platform.edits.lock().unwrap();
        assert!(edits[0].1.contains("recompile request by alice"));
        assert!(platform.replies.lock().unwrap().is_empty());
    }
}
