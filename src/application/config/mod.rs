//! 애플리케이션이 사용하는 설정 스키마(순수 데이터).
//!
//! 주의: 파일/환경변수/프로세스 접근은 `infrastructure`에서만 수행한다.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::format::ReplyStyle;
use crate::domain::spam::SpamRules;
use crate::domain::submission::ResultCode;

pub const DEFAULT_HANDLE: &str = "runpilot";
pub const DEFAULT_USER_AGENT: &str = "runpilot/0.1 (forum compile bot)";
pub const DEFAULT_MODERATION_GROUP: &str = "runpilot";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_SECS: u64 = 5;
pub const DEFAULT_MAX_REPEATED_FAILURES: u32 = 5;

pub const DEFAULT_OUTPUT_LINE_LIMIT: usize = 100;
pub const DEFAULT_OUTPUT_KEEP_LINES: usize = 25;
pub const DEFAULT_OUTPUT_CHAR_LIMIT: usize = 8_000;
/// `--include-errors`가 인라인 게시를 허용하는 결과 코드의 기본 집합.
pub const DEFAULT_INCLUDE_ERROR_CODES: &[&str] = &["compile_error", "runtime_error"];

pub const DEFAULT_SPAM_LINE_LIMIT: usize = 1_000;
pub const DEFAULT_SPAM_CHAR_LIMIT: usize = 10_000;
pub const DEFAULT_DENIED_INDICATOR: &str = "Permission denied";

pub const DEFAULT_FOOTER: &str =
    "---\n\n[submission]({submission_url}) | [original]({origin_url})\n";
pub const DEFAULT_ERROR_POSTAMBLE: &str = "---\n\nRequested here: {origin_url}";
pub const DEFAULT_HELP_TEXT: &str = "Mention me with `+<handle> <language> [options]`, followed \
by a blank line and a code block indented by four spaces. Add an `Input:` line and a second \
indented block to supply stdin. Options: --source --input --date --memory --time --version \
--include-errors. Message commands: --help, --report <text>, --recompile <link>.";
pub const DEFAULT_FORMAT_ERROR_TEXT: &str = "There was an error processing your request. Make \
sure the code block is indented by four spaces and starts after the language line.";
pub const DEFAULT_LANGUAGE_ERROR_TEXT: &str =
    "The language you specified was not recognized. Did you mean one of the following?";
pub const DEFAULT_COMPILE_ERROR_TEXT: &str = "Your code triggered a compile error.";
pub const DEFAULT_RUNTIME_ERROR_TEXT: &str = "Your code triggered a runtime error.";
pub const DEFAULT_TIMEOUT_ERROR_TEXT: &str =
    "Your program took too long to finish and was terminated.";
pub const DEFAULT_MEMORY_ERROR_TEXT: &str = "Your program exceeded the memory limit.";
pub const DEFAULT_ILLEGAL_ERROR_TEXT: &str =
    "Your program attempted an operation that is not permitted in the sandbox.";
pub const DEFAULT_INTERNAL_ERROR_TEXT: &str =
    "The execution service reported an internal error. Please try again later.";
pub const DEFAULT_RECOMPILE_ERROR_TEXT: &str =
    "The comment you asked to recompile could not be found.";
pub const DEFAULT_RECOMPILE_AUTHOR_ERROR_TEXT: &str =
    "Only the author of a comment can request that it be recompiled.";
pub const DEFAULT_RECOMPILE_NOTICE: &str =
    "*(edited in response to a recompile request by {requester})*";
pub const DEFAULT_REPORT_ACK_TEXT: &str =
    "Thanks! Your report has been forwarded to the moderators.";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// 봇 신원/운영 계정 설정
    #[serde(default)]
    pub bot: BotConfig,
    /// 포럼 플랫폼 API 설정
    #[serde(default)]
    pub platform: PlatformConfig,
    /// 샌드박스 실행 서비스 설정
    #[serde(default)]
    pub sandbox: SandboxConfig,
    /// 회신 절단/재시도 한계값
    #[serde(default)]
    pub limits: LimitsConfig,
    /// 스팸 휴리스틱 설정
    #[serde(default)]
    pub spam: SpamConfig,
    /// 사용자 입력 언어명 -> 서비스 언어명 별칭 표
    #[serde(default)]
    pub lang_aliases: HashMap<String, String>,
    /// 사용자에게 보이는 문구 템플릿
    #[serde(default)]
    pub text: TextConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BotConfig {
    /// 멘션 대상 핸들. `+핸들` 형태로 호출된다.
    pub handle: Option<String>,
    pub user_agent: Option<String>,
    /// 경보를 받을 운영자 계정
    pub admin_user: Option<String>,
    /// 차단 목록을 읽어 올 그룹
    pub moderation_group: Option<String>,
    /// 감시 모드에서 사이클 사이에 쉬는 시간(초)
    pub cycle_interval_secs: Option<u64>,
    /// 동일 실패가 이 횟수만큼 반복되면 감시 루프를 중단한다
    pub max_repeated_failures: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PlatformConfig {
    pub api_base: Option<String>,
    /// 고정 토큰(민감정보: 권장하지 않음)
    pub token: Option<String>,
    /// 토큰을 읽을 환경변수 이름
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SandboxConfig {
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
    /// 제출 완료를 확인하는 폴링 간격(초)
    pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LimitsConfig {
    pub output_line_limit: Option<usize>,
    pub output_keep_lines: Option<usize>,
    pub output_char_limit: Option<usize>,
    /// `--include-errors`가 인라인 게시를 허용하는 결과 코드 집합
    pub include_error_codes: Option<Vec<String>>,
    /// 전달 재시도 최대 횟수
    pub max_attempts: Option<u32>,
    /// 일반 오류 재시도 시 시도 횟수에 비례하는 대기 단위(초)
    pub backoff_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SpamConfig {
    pub line_limit: Option<usize>,
    pub char_limit: Option<usize>,
    pub phrases: Option<Vec<String>>,
    /// 스팸 경보를 생략할 그룹 목록
    pub ignore_groups: Option<Vec<String>>,
    pub denied_indicator: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TextConfig {
    pub help: Option<String>,
    pub footer: Option<String>,
    pub error_preamble: Option<String>,
    pub error_postamble: Option<String>,
    pub format_error: Option<String>,
    pub language_error: Option<String>,
    pub compile_error: Option<String>,
    pub runtime_error: Option<String>,
    pub timeout_error: Option<String>,
    pub memory_error: Option<String>,
    pub illegal_error: Option<String>,
    pub internal_error: Option<String>,
    pub recompile_error: Option<String>,
    pub recompile_author_error: Option<String>,
    pub recompile_notice: Option<String>,
    pub report_ack: Option<String>,
}

impl Config {
    pub fn handle(&self) -> String {
        self.bot
            .handle
            .clone()
            .unwrap_or_else(|| DEFAULT_HANDLE.to_string())
    }

    pub fn user_agent(&self) -> String {
        self.bot
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn admin_user(&self) -> Option<&str> {
        self.bot.admin_user.as_deref()
    }

    pub fn moderation_group(&self) -> String {
        self.bot
            .moderation_group
            .clone()
            .unwrap_or_else(|| DEFAULT_MODERATION_GROUP.to_string())
    }

    pub fn cycle_interval_secs(&self) -> u64 {
        self.bot
            .cycle_interval_secs
            .unwrap_or(DEFAULT_CYCLE_INTERVAL_SECS)
    }

    pub fn max_repeated_failures(&self) -> u32 {
        self.bot
            .max_repeated_failures
            .unwrap_or(DEFAULT_MAX_REPEATED_FAILURES)
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.sandbox
            .poll_interval_secs
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
    }

    pub fn max_attempts(&self) -> u32 {
        self.limits.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS)
    }

    pub fn backoff_secs(&self) -> u64 {
        self.limits.backoff_secs.unwrap_or(DEFAULT_BACKOFF_SECS)
    }

    /// 포매터에 넘길 절단 한계값과 푸터 템플릿.
    pub fn reply_style(&self) -> ReplyStyle {
        ReplyStyle {
            output_line_limit: self
                .limits
                .output_line_limit
                .unwrap_or(DEFAULT_OUTPUT_LINE_LIMIT),
            output_keep_lines: self
                .limits
                .output_keep_lines
                .unwrap_or(DEFAULT_OUTPUT_KEEP_LINES),
            output_char_limit: self
                .limits
                .output_char_limit
                .unwrap_or(DEFAULT_OUTPUT_CHAR_LIMIT),
            footer_template: self
                .text
                .footer
                .clone()
                .unwrap_or_else(|| DEFAULT_FOOTER.to_string()),
        }
    }

    pub fn spam_rules(&self) -> SpamRules {
        SpamRules {
            line_limit: self.spam.line_limit.unwrap_or(DEFAULT_SPAM_LINE_LIMIT),
            char_limit: self.spam.char_limit.unwrap_or(DEFAULT_SPAM_CHAR_LIMIT),
            phrases: self.spam.phrases.clone().unwrap_or_default(),
            denied_indicator: self
                .spam
                .denied_indicator
                .clone()
                .unwrap_or_else(|| DEFAULT_DENIED_INDICATOR.to_string()),
        }
    }

    /// 스팸 경보를 건너뛸 그룹 목록(소문자 정규화).
    pub fn spam_ignore_groups(&self) -> BTreeSet<String> {
        self.spam
            .ignore_groups
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|group| group.to_lowercase())
            .collect()
    }

    /// `--include-errors` 정책 집합. 포함 기준은 하드코딩이 아니라 설정값이다.
    pub fn include_error_codes(&self) -> BTreeSet<String> {
        match &self.limits.include_error_codes {
            Some(codes) => codes.iter().map(|code| code.to_lowercase()).collect(),
            None => DEFAULT_INCLUDE_ERROR_CODES
                .iter()
                .map(|code| code.to_string())
                .collect(),
        }
    }

    /// 별칭 표를 거쳐 실행 서비스에 넘길 언어명을 정한다.
    pub fn resolve_language(&self, spec: &str) -> String {
        let key = spec.trim().to_lowercase();
        self.lang_aliases
            .get(&key)
            .cloned()
            .unwrap_or_else(|| spec.trim().to_string())
    }

    pub fn help_text(&self) -> String {
        self.text
            .help
            .clone()
            .unwrap_or_else(|| DEFAULT_HELP_TEXT.to_string())
    }

    pub fn error_preamble(&self) -> Option<&str> {
        self.text.error_preamble.as_deref().filter(|s| !s.is_empty())
    }

    pub fn error_postamble(&self) -> String {
        self.text
            .error_postamble
            .clone()
            .unwrap_or_else(|| DEFAULT_ERROR_POSTAMBLE.to_string())
    }

    pub fn format_error_text(&self) -> String {
        self.text
            .format_error
            .clone()
            .unwrap_or_else(|| DEFAULT_FORMAT_ERROR_TEXT.to_string())
    }

    pub fn language_error_text(&self) -> String {
        self.text
            .language_error
            .clone()
            .unwrap_or_else(|| DEFAULT_LANGUAGE_ERROR_TEXT.to_string())
    }

    /// 실패 결과 코드별 고정 안내 문구.
    pub fn error_text(&self, code: ResultCode) -> String {
        let (configured, fallback) = match code {
            ResultCode::CompileError => (&self.text.compile_error, DEFAULT_COMPILE_ERROR_TEXT),
            ResultCode::RuntimeError => (&self.text.runtime_error, DEFAULT_RUNTIME_ERROR_TEXT),
            ResultCode::Timeout => (&self.text.timeout_error, DEFAULT_TIMEOUT_ERROR_TEXT),
            ResultCode::MemoryError => (&self.text.memory_error, DEFAULT_MEMORY_ERROR_TEXT),
            ResultCode::IllegalOperation => (&self.text.illegal_error, DEFAULT_ILLEGAL_ERROR_TEXT),
            ResultCode::Success | ResultCode::InternalError => {
                (&self.text.internal_error, DEFAULT_INTERNAL_ERROR_TEXT)
            }
        };
        configured.clone().unwrap_or_else(|| fallback.to_string())
    }

    pub fn recompile_error_text(&self) -> String {
        self.text
            .recompile_error
            .clone()
            .unwrap_or_else(|| DEFAULT_RECOMPILE_ERROR_TEXT.to_string())
    }

    pub fn recompile_author_error_text(&self) -> String {
        self.text
            .recompile_author_error
            .clone()
            .unwrap_or_else(|| DEFAULT_RECOMPILE_AUTHOR_ERROR_TEXT.to_string())
    }

    pub fn recompile_notice(&self) -> String {
        self.text
            .recompile_notice
            .clone()
            .unwrap_or_else(|| DEFAULT_RECOMPILE_NOTICE.to_string())
    }

    pub fn report_ack_text(&self) -> String {
        self.text
            .report_ack
            .clone()
            .unwrap_or_else(|| DEFAULT_REPORT_ACK_TEXT.to_string())
    }

    /// 후순위(나중 파일) 값으로 덮어쓰는 병합 규칙.
    pub fn merge_from(&mut self, other: Config) {
        self.bot.merge_from(other.bot);
        self.platform.merge_from(other.platform);
        self.sandbox.merge_from(other.sandbox);
        self.limits.merge_from(other.limits);
        self.spam.merge_from(other.spam);
        self.lang_aliases.extend(other.lang_aliases);
        self.text.merge_from(other.text);
    }
}

macro_rules! merge_fields {
    ($target:ident, $other:ident, $($field:ident),+ $(,)?) => {
        $(
            if $other.$field.is_some() {
                $target.$field = $other.$field;
            }
        )+
    };
}

impl BotConfig {
    pub fn merge_from(&mut self, other: BotConfig) {
        merge_fields!(
            self,
            other,
            handle,
            user_agent,
            admin_user,
            moderation_group,
            cycle_interval_secs,
            max_repeated_failures,
        );
    }
}

impl PlatformConfig {
    pub fn merge_from(&mut self, other: PlatformConfig) {
        merge_fields!(self, other, api_base, token, token_env);
    }
}

impl SandboxConfig {
    pub fn merge_from(&mut self, other: SandboxConfig) {
        merge_fields!(self, other, api_base, api_key, api_key_env, poll_interval_secs);
    }
}

impl LimitsConfig {
    pub fn merge_from(&mut self, other: LimitsConfig) {
        merge_fields!(
            self,
            other,
            output_line_limit,
            output_keep_lines,
            output_char_limit,
            include_error_codes,
            max_attempts,
            backoff_secs,
        );
    }
}

impl SpamConfig {
    pub fn merge_from(&mut self, other: SpamConfig) {
        merge_fields!(
            self,
            other,
            line_limit,
            char_limit,
            phrases,
            ignore_groups,
            denied_indicator,
        );
    }
}

impl TextConfig {
    pub fn merge_from(&mut self, other: TextConfig) {
        merge_fields!(
            self,
            other,
            help,
            footer,
            error_preamble,
            error_postamble,
            format_error,
            language_error,
            compile_error,
            runtime_error,
            timeout_error,
            memory_error,
            illegal_error,
            internal_error,
            recompile_error,
            recompile_author_error,
            recompile_notice,
            report_ack,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_values_override_earlier_ones() {
        let mut base: Config = serde_json::from_str(
            r#"{ "bot": { "handle": "base" }, "spam": { "line_limit": 10 } }"#,
        )
        .unwrap();
        let overlay: Config = serde_json::from_str(
            r#"{ "bot": { "handle": "overlay" }, "lang_aliases": { "py": "python 3" } }"#,
        )
        .unwrap();

        base.merge_from(overlay);
        assert_eq!(base.handle(), "overlay");
        assert_eq!(base.spam_rules().line_limit, 10);
        assert_eq!(base.resolve_language("PY"), "python 3");
    }

    #[test]
    fn include_error_codes_defaults_to_restrictive_set() {
        let config = Config::default();
        let codes = config.include_error_codes();
        assert!(codes.contains("compile_error"));
        assert!(codes.contains("runtime_error"));
        assert!(!codes.contains("timeout"));
    }

    #[test]
    fn unknown_language_passes_through_trimmed() {
        let config = Config::default();
        assert_eq!(config.resolve_language("  Brainfuck "), "Brainfuck");
    }
}
