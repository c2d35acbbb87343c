//! 수신함 처리 유스케이스.
//!
//! 한 사이클은 차단 목록 적재, 읽지 않은 항목 조회, 항목별 처리(분류 -> 전달
//! -> 스팸 검사), 읽음 처리로 이루어진다. 항목 하나의 실패가 사이클 전체를
//! 멈추지 않도록 실패는 경보로 돌리고 계속 진행한다.

mod classify;
mod dispatch;
mod recompile;

use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::application::config::Config;
use crate::application::ports::{ExecutionService, PlatformGateway};
use crate::domain::format::code_block;
use crate::domain::item::{InboxItem, ItemKind};
use crate::domain::reply::{CompiledReply, MessageReply, Reply};
use crate::domain::request;
use crate::domain::spam;

use dispatch::{Delivery, DeliveryContext, Dispatcher};

pub struct ProcessInboxUseCase<'a> {
    pub config: &'a Config,
    pub exec: &'a dyn ExecutionService,
    pub platform: &'a dyn PlatformGateway,
}

impl ProcessInboxUseCase<'_> {
    /// 읽지 않은 수신함 항목을 도착 순서대로 처리한다.
    pub async fn execute(&self) -> Result<()> {
        let banned = self.load_banned().await;
        let items = self.platform.fetch_unread().await?;
        info!(count = items.len(), "fetched unread inbox items");

        for item in &items {
            if let Err(err) = self.process_item(item, &banned).await {
                error!(item = %item.id, error = %format!("{err:#}"), "failed to process inbox item");
                self.alert_admin(&format!(
                    "Error processing item {}:\n{}",
                    item.id,
                    code_block(&format!("{err:#}"))
                ))
                .await;
            }
            // 실패한 항목도 읽음 처리해 같은 항목을 반복해서 붙잡지 않는다.
            if let Err(err) = self.platform.mark_read(&item.id).await {
                warn!(item = %item.id, error = %err, "failed to mark item as read");
            }
        }
        Ok(())
    }

    /// 차단 목록을 소문자 정규화해 적재한다. 조회 실패는 빈 목록으로 진행한다.
    async fn load_banned(&self) -> BTreeSet<String> {
        match self
            .platform
            .banned_users(&self.config.moderation_group())
            .await
        {
            Ok(users) => users.into_iter().map(|user| user.to_lowercase()).collect(),
            Err(err) => {
                warn!(error = %err, "could not load the banned user list; proceeding without it");
                BTreeSet::new()
            }
        }
    }

    async fn process_item(&self, item: &InboxItem, banned: &BTreeSet<String>) -> Result<()> {
        if let Some(author) = item.author.as_deref()
            && banned.contains(&author.to_lowercase())
        {
            info!(item = %item.id, author, "ignoring item from a banned user");
            return Ok(());
        }

        match &item.kind {
            ItemKind::Message => self.process_message(item).await,
            ItemKind::Comment { .. } => {
                if request::contains_mention(&item.body, &self.config.handle()) {
                    self.process_compile(item).await
                } else {
                    info!(item = %item.id, "comment without a mention; skipping");
                    Ok(())
                }
            }
        }
    }

    /// 쪽지는 명령(--help / --recompile / --report)을 먼저 본다.
    /// 명령이 아니면 댓글과 똑같이 멘션 기반 컴파일 요청으로 다룬다.
    async fn process_message(&self, item: &InboxItem) -> Result<()> {
        let body = item.body.trim();

        if strip_command(body, "--help").is_some() {
            let help = MessageReply::with_subject(self.config.help_text(), "help");
            return self
                .deliver_and_scan(&Reply::Message(help), &DeliveryContext::plain(item))
                .await;
        }

        if let Some(rest) = strip_command(body, "--recompile") {
            let Some(target) = rest.split_whitespace().next() else {
                let refusal =
                    MessageReply::with_subject(self.config.recompile_error_text(), "recompile");
                return self
                    .deliver_and_scan(&Reply::Message(refusal), &DeliveryContext::plain(item))
                    .await;
            };
            return recompile::run(self, item, target).await;
        }

        if strip_command(body, "--report").is_some() {
            return self.forward_report(item).await;
        }

        if request::contains_mention(&item.body, &self.config.handle()) {
            return self.process_compile(item).await;
        }

        info!(item = %item.id, "message without a command or mention; skipping");
        Ok(())
    }

    /// 신고 본문을 운영자에게 그대로 넘기고 신고자에게 접수 쪽지를 보낸다.
    async fn forward_report(&self, item: &InboxItem) -> Result<()> {
        let reporter = item.author.as_deref().unwrap_or("unknown");
        self.alert_admin(&format!(
            "Report from {reporter}:\n{}",
            code_block(&item.body)
        ))
        .await;

        let ack = MessageReply::with_subject(self.config.report_ack_text(), "report");
        self.deliver_and_scan(&Reply::Message(ack), &DeliveryContext::plain(item))
            .await
    }

    async fn process_compile(&self, item: &InboxItem) -> Result<()> {
        let reply = classify::build_reply(self.exec, self.config, item).await?;
        self.deliver_and_scan(&reply, &DeliveryContext::plain(item))
            .await
    }

    /// 회신을 전달하고, 공개 게시/수정에 성공한 경우에만 스팸 휴리스틱을
    /// 돌린다. 쪽지 회신은 검사 대상이 아니다.
    async fn deliver_and_scan(&self, reply: &Reply, ctx: &DeliveryContext<'_>) -> Result<()> {
        let dispatcher = Dispatcher {
            platform: self.platform,
            config: self.config,
        };
        let delivery = dispatcher.deliver(reply, ctx).await?;

        if let Reply::Compiled(compiled) = reply
            && matches!(delivery, Delivery::Posted | Delivery::Edited { .. })
        {
            self.scan_for_spam(compiled).await;
        }
        Ok(())
    }

    async fn scan_for_spam(&self, compiled: &CompiledReply) {
        let triggers = spam::scan(compiled, &self.config.spam_rules());
        if triggers.is_empty() {
            return;
        }

        let group = compiled
            .origin
            .group()
            .unwrap_or_default()
            .to_lowercase();
        if self.config.spam_ignore_groups().contains(&group) {
            info!(group, "spam triggers in an ignored group; no alert");
            return;
        }

        let labels: Vec<&str> = triggers.iter().map(|trigger| trigger.label()).collect();
        warn!(item = %compiled.origin.id, ?labels, "posted reply tripped spam heuristics");

        let origin = compiled.origin.permalink().unwrap_or(&compiled.origin.id);
        self.alert_admin(&format!(
            "Possible spam on {origin}:\n{}",
            code_block(&labels.join("\n"))
        ))
        .await;
    }

    /// 운영자 계정으로 경보 쪽지를 보낸다. 계정이 없거나 전송이 실패해도
    /// 사이클은 계속된다.
    async fn alert_admin(&self, body: &str) {
        let Some(admin) = self.config.admin_user() else {
            return;
        };
        let subject = format!("{} alert", self.config.handle());
        if let Err(err) = self.platform.send_message(admin, &subject, body).await {
            warn!(error = %err, "failed to send an admin alert");
        }
    }
}

/// 본문이 명령으로 시작하면(대소문자 무시) 명령 뒤 나머지를 돌려준다.
fn strip_command<'a>(body: &'a str, command: &str) -> Option<&'a str> {
    let len = command.len();
    if body.len() >= len && body.as_bytes()[..len].eq_ignore_ascii_case(command.as_bytes()) {
        Some(body[len..].trim_start())
    } else {
        None
    }
}
