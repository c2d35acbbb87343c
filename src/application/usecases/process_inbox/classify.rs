//! 요청 분류 단계.
//! 본문 파싱과 실행 제출 결과를 합쳐, 항목 하나당 정확히 하나의 회신을 만든다.

use anyhow::Result;
use tracing::{info, warn};

use crate::application::config::Config;
use crate::application::ports::{ExecError, ExecutionService};
use crate::domain::format::{self, format_reply};
use crate::domain::item::InboxItem;
use crate::domain::reply::{CompiledReply, MessageReply, Reply};
use crate::domain::request::{self, MalformedRequest, ParsedRequest};
use crate::domain::submission::SubmissionResult;

/// 수신함 항목 하나를 회신으로 분류한다.
///
/// 파싱 실패와 언어 인식 실패, 인라인 허용 목록 밖의 실행 실패는 전부 쪽지
/// 변형으로 귀결된다. 실행 서비스 자체의 오류만 호출자에게 전파한다.
pub(super) async fn build_reply(
    exec: &dyn ExecutionService,
    config: &Config,
    item: &InboxItem,
) -> Result<Reply> {
    let request = match request::parse(&item.body, &config.handle()) {
        Ok(request) => request,
        Err(MalformedRequest) => {
            warn!(item = %item.id, "request body did not parse; sending format guidance");
            let body = wrap_message(config, &config.format_error_text(), item);
            return Ok(Reply::Message(MessageReply::new(body)));
        }
    };

    let language = config.resolve_language(&request.language_spec);
    let result = match exec.submit(&request.source, &language, &request.stdin).await {
        Ok(result) => result,
        Err(ExecError::UnrecognizedLanguage { language, similar }) => {
            info!(item = %item.id, %language, "language was not recognized");
            let body = wrap_message(config, &language_suggestions(config, &similar), item);
            return Ok(Reply::Message(MessageReply::new(body)));
        }
        Err(ExecError::Service(err)) => return Err(err),
    };

    if result.code.is_success() || inline_allowed(config, &request, &result) {
        let text = format_reply(&result, &request.options, &config.reply_style(), origin_ref(item));
        return Ok(Reply::Compiled(CompiledReply::new(text, result, item.clone())));
    }

    info!(item = %item.id, code = result.code.label(), "execution failed; replying privately");
    let body = format::failure_message(&config.error_text(result.code), &result);
    Ok(Reply::Message(MessageReply::new(wrap_message(
        config, &body, item,
    ))))
}

/// 실패 결과를 공개 댓글로 게시할지 여부.
/// 요청자가 `--include-errors`를 켰고, 결과 코드가 설정된 허용 집합에
/// 들어 있을 때만 허용한다.
fn inline_allowed(config: &Config, request: &ParsedRequest, result: &SubmissionResult) -> bool {
    request.has_option("--include-errors")
        && config.include_error_codes().contains(result.code.label())
}

fn language_suggestions(config: &Config, similar: &[String]) -> String {
    let mut body = config.language_error_text();
    for name in similar {
        body.push_str("\n- ");
        body.push_str(name);
    }
    body
}

/// 쪽지 본문을 머리말/꼬리말 템플릿으로 감싼다.
/// 꼬리말의 `{origin_url}`에는 원 항목의 고유 링크(없으면 id)가 들어간다.
fn wrap_message(config: &Config, body: &str, item: &InboxItem) -> String {
    let mut out = String::new();
    if let Some(preamble) = config.error_preamble() {
        out.push_str(preamble.trim_end());
        out.push_str("\n\n");
    }
    out.push_str(body.trim_end());

    let postamble = config.error_postamble();
    if !postamble.is_empty() {
        out.push_str("\n\n");
        out.push_str(&postamble.replace("{origin_url}", &format::encode_link(origin_ref(item))));
    }
    out
}

fn origin_ref(item: &InboxItem) -> &str {
    item.permalink().unwrap_or(&item.id)
}
