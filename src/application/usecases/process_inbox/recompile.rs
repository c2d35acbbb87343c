//! 재컴파일 명령 처리.
//! 쪽지로 받은 `--recompile <링크>`를 원 댓글 재실행과 기존 봇 댓글 수정으로
//! 연결한다. 원 댓글 작성자 본인만 요청할 수 있다.

use anyhow::Result;
use tracing::{info, warn};
use url::Url;

use super::ProcessInboxUseCase;
use super::classify;
use super::dispatch::DeliveryContext;
use crate::domain::item::InboxItem;
use crate::domain::reply::{MessageReply, Reply};

pub(super) async fn run(
    use_case: &ProcessInboxUseCase<'_>,
    request_item: &InboxItem,
    target: &str,
) -> Result<()> {
    let Some(requester) = request_item.author.clone() else {
        warn!(item = %request_item.id, "recompile request without an author; dropping");
        return Ok(());
    };

    let path = thread_path(target);
    let thread = use_case.platform.fetch_thread(&path).await?;

    let Some(thread) = thread else {
        info!(item = %request_item.id, target, "recompile target was not found");
        let refusal = MessageReply::with_subject(use_case.config.recompile_error_text(), "recompile");
        return use_case
            .deliver_and_scan(
                &Reply::Message(refusal),
                &DeliveryContext::plain(request_item),
            )
            .await;
    };

    let authorized = thread
        .item
        .author
        .as_deref()
        .is_some_and(|author| author.eq_ignore_ascii_case(&requester));
    if !authorized {
        info!(item = %request_item.id, requester, "recompile requested by a non-author");
        let refusal =
            MessageReply::with_subject(use_case.config.recompile_author_error_text(), "recompile");
        return use_case
            .deliver_and_scan(
                &Reply::Message(refusal),
                &DeliveryContext::plain(request_item),
            )
            .await;
    }

    let reply = classify::build_reply(use_case.exec, use_case.config, &thread.item).await?;
    let ctx = DeliveryContext {
        origin: &thread.item,
        recompile_requester: Some(&requester),
        edit_candidates: &thread.children,
    };
    use_case.deliver_and_scan(&reply, &ctx).await
}

/// 전체 URL이면 경로만 추려 내고, 아니면 받은 그대로를 경로로 쓴다.
fn thread_path(target: &str) -> String {
    match Url::parse(target) {
        Ok(url) => url.path().to_string(),
        Err(_) => target.to_string(),
    }
}
