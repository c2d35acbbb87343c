//! 회신 본문 포매터.
//! 섹션 구성과 절단 규칙으로 모든 회신을 플랫폼 길이 한도 아래로 유지한다.

use std::collections::BTreeSet;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::domain::submission::SubmissionResult;

/// 전체 회신 길이의 조립 상한. 하드 한도(10,000)보다 여유를 둔다.
pub const REPLY_CEILING: usize = 9_800;

const ELLIPSIS: &str = "...";

/// 중복 줄 축약 판정 기준: 유지 구간의 서로 다른 줄 수가 이 값 미만이면
const DUPLICATE_DISTINCT_MIN: usize = 5;
/// 이 수만큼만 남긴다.
const DUPLICATE_RETAIN: usize = 2;

/// 마크다운 링크를 깨뜨리는 문자까지 이스케이프한다.
const LINK_SET: &AsciiSet = &CONTROLS.add(b' ').add(b'(').add(b')').add(b'<').add(b'>');

/// 포매터가 참조하는 절단 임계값과 푸터 템플릿.
#[derive(Debug, Clone)]
pub struct ReplyStyle {
    /// 이 줄 수를 넘는 출력은 절단 대상이다.
    pub output_line_limit: usize,
    /// 절단 시 유지할 줄 수.
    pub output_keep_lines: usize,
    /// 줄 절단 이후에도 적용되는 바이트 상한.
    pub output_char_limit: usize,
    /// `{submission_url}` / `{origin_url}` 자리표시자를 갖는 푸터 템플릿.
    pub footer_template: String,
}

/// 섹션 자리. 표시 순서는 선언 순서, 예산 배정은 `priority` 순서를 따른다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Source,
    Input,
    Output,
    CompilerInfo,
    Date,
    Memory,
    Time,
    Version,
    Footer,
}

impl Slot {
    /// 예산 우선순위. 푸터가 가장 먼저, 실제 출력이 그다음, 장식 항목이 마지막.
    fn priority(self) -> u8 {
        match self {
            Self::Footer => 0,
            Self::Output => 1,
            Self::CompilerInfo => 2,
            Self::Source => 3,
            Self::Input => 4,
            Self::Date => 5,
            Self::Memory => 6,
            Self::Time => 7,
            Self::Version => 8,
        }
    }
}

/// 실행 결과와 옵션 플래그로 최종 댓글 본문을 만든다.
///
/// 항상 성공하며 결과 길이는 `REPLY_CEILING` 이하다. 예산을 넘기는 첫 섹션은
/// 제자리에서 절단되고, 그보다 낮은 우선순위 섹션은 통째로 빠진다.
pub fn format_reply(
    result: &SubmissionResult,
    options: &BTreeSet<String>,
    style: &ReplyStyle,
    origin_url: &str,
) -> String {
    let mut sections: Vec<(Slot, String)> = Vec::new();

    if options.contains("--source") {
        sections.push((Slot::Source, section_block("Source", &result.source)));
    }
    if options.contains("--input") {
        sections.push((Slot::Input, section_block("Input", &result.stdin)));
    }

    let output = truncate_output(&result.combined_output(), style);
    sections.push((Slot::Output, section_block("Output", &output)));

    if !result.compiler_info.is_empty() {
        sections.push((
            Slot::CompilerInfo,
            section_block("Compiler Info", &result.compiler_info),
        ));
    }

    if options.contains("--date") {
        sections.push((Slot::Date, format!("Date: {}\n\n", result.submitted_at)));
    }
    if options.contains("--memory") {
        sections.push((
            Slot::Memory,
            format!("Memory Usage: {} bytes\n\n", result.memory_bytes),
        ));
    }
    if options.contains("--time") {
        sections.push((
            Slot::Time,
            format!("Execution Time: {} seconds\n\n", result.time_secs),
        ));
    }
    if options.contains("--version") {
        sections.push((
            Slot::Version,
            format!("Version: {}\n\n", result.language_version),
        ));
    }

    sections.push((Slot::Footer, render_footer(style, &result.link, origin_url)));

    assemble(sections)
}

/// 결과 코드별 오류 템플릿 뒤에 사용 가능한 진단을 들여쓴 블록으로 붙인다.
/// 쪽지로 전달되는 실패 회신의 본문을 만든다.
pub fn failure_message(template: &str, result: &SubmissionResult) -> String {
    let mut out = template.trim_end().to_string();
    out.push_str("\n\n");
    if !result.compiler_info.is_empty() {
        out.push_str(&section_block("Compiler Info", &result.compiler_info));
    }
    if !result.stdout.is_empty() {
        out.push_str(&section_block("Output", &result.stdout));
    }
    if !result.stderr.is_empty() {
        out.push_str(&section_block("Error Output", &result.stderr));
    }
    out
}

/// 모든 줄 앞에 4칸 마커를 붙여 마크다운 코드 블록으로 만든다.
/// 캐리지 리턴도 줄바꿈과 동일하게 취급한다.
pub fn code_block(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(normalized.len() + 32);
    for line in normalized.split('\n') {
        out.push_str("\n    ");
        out.push_str(line);
    }
    out
}

/// URL을 마크다운 링크에 안전한 형태로 이스케이프한다.
pub fn encode_link(url: &str) -> String {
    utf8_percent_encode(url, LINK_SET).to_string()
}

/// UTF-8 경계를 지키며 `max_bytes` 이하로 자르고 말줄임 표시를 붙인다.
pub fn truncate_with_marker(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut cutoff = max_bytes.saturating_sub(ELLIPSIS.len());
    while cutoff > 0 && !text.is_char_boundary(cutoff) {
        cutoff -= 1;
    }
    let mut out = text[..cutoff].to_string();
    out.push_str(ELLIPSIS);
    out
}

fn section_block(title: &str, body: &str) -> String {
    format!("{title}:\n{}\n\n", code_block(body))
}

fn render_footer(style: &ReplyStyle, submission_url: &str, origin_url: &str) -> String {
    style
        .footer_template
        .replace("{submission_url}", &encode_link(submission_url))
        .replace("{origin_url}", &encode_link(origin_url))
}

/// 줄 수 가드와 바이트 가드를 차례로 적용한다.
///
/// 유지 구간이 대부분 같은 줄의 반복이면 2줄만 남겨, 짧은 줄을 쏟아내는
/// 단순 도배가 절단 이후에도 자리를 차지하지 못하게 한다.
fn truncate_output(output: &str, style: &ReplyStyle) -> String {
    let mut text = output.to_string();

    let lines: Vec<&str> = output.lines().collect();
    if lines.len() > style.output_line_limit {
        let keep = style.output_keep_lines.min(lines.len());
        let distinct: BTreeSet<&str> = lines[..keep].iter().copied().collect();
        let retain = if distinct.len() < DUPLICATE_DISTINCT_MIN {
            DUPLICATE_RETAIN.min(keep)
        } else {
            keep
        };
        text = lines[..retain].join("\n");
        text.push('\n');
        text.push_str(ELLIPSIS);
    }

    if text.len() > style.output_char_limit {
        text = truncate_with_marker(&text, style.output_char_limit);
    }
    text
}

/// 예산 우선순위로 포함 여부를 정한 뒤 표시 순서대로 이어 붙인다.
fn assemble(mut sections: Vec<(Slot, String)>) -> String {
    let mut order: Vec<usize> = (0..sections.len()).collect();
    order.sort_by_key(|&idx| sections[idx].0.priority());

    let mut included = vec![false; sections.len()];
    let mut budget = REPLY_CEILING;
    for &idx in &order {
        let len = sections[idx].1.len();
        if len <= budget {
            budget -= len;
            included[idx] = true;
        } else {
            if budget > ELLIPSIS.len() {
                sections[idx].1 = truncate_with_marker(&sections[idx].1, budget);
                included[idx] = true;
            }
            // 절단이 발생하면 남은 섹션은 모두 버린다.
            break;
        }
    }

    sections
        .into_iter()
        .zip(included)
        .filter_map(|((_, text), keep)| keep.then_some(text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::submission::{ResultCode, SubmissionResult};

    fn style() -> ReplyStyle {
        ReplyStyle {
            output_line_limit: 100,
            output_keep_lines: 25,
            output_char_limit: 8_000,
            footer_template: "---\n\n[submission]({submission_url}) | [origin]({origin_url})\n"
                .to_string(),
        }
    }

    fn result_with_output(stdout: &str) -> SubmissionResult {
        SubmissionResult {
            source: "print(\"Test\")".to_string(),
            stdin: String::new(),
            stdout: stdout.to_string(),
            stderr: String::new(),
            compiler_info: String::new(),
            code: ResultCode::Success,
            time_secs: 0.02,
            memory_bytes: 3_456,
            submitted_at: "2014-03-01 12:00:00".to_string(),
            language_version: "Python (2.7.3)".to_string(),
            link: "https://sandbox.example/s/abc 123".to_string(),
        }
    }

    #[test]
    fn code_block_indents_every_line() {
        assert_eq!(code_block("\nHello\nWorld"), "\n    \n    Hello\n    World");
        // 캐리지 리턴도 줄 경계로 취급한다.
        assert_eq!(
            code_block("\tHello\rCarriage\n\r Return"),
            "\n    \tHello\n    Carriage\n    \n     Return"
        );
    }

    #[test]
    fn output_section_is_rendered_as_block() {
        let reply = format_reply(&result_with_output("Test"), &BTreeSet::new(), &style(), "/c/1");
        assert!(reply.contains("Output:\n\n    Test\n"));
        // 게이트되지 않은 섹션은 나타나지 않는다.
        assert!(!reply.contains("Source:"));
        assert!(!reply.contains("Execution Time:"));
    }

    #[test]
    fn optional_sections_follow_their_flags() {
        let options: BTreeSet<String> = ["--source", "--time", "--version"]
            .into_iter()
            .map(String::from)
            .collect();
        let reply = format_reply(&result_with_output("ok"), &options, &style(), "/c/1");
        assert!(reply.contains("Source:\n\n    print(\"Test\")\n"));
        assert!(reply.contains("Execution Time: 0.02 seconds\n"));
        assert!(reply.contains("Version: Python (2.7.3)\n"));
        assert!(!reply.contains("Memory Usage:"));
        assert!(!reply.contains("Date:"));
    }

    #[test]
    fn footer_links_are_percent_encoded() {
        let reply = format_reply(&result_with_output("ok"), &BTreeSet::new(), &style(), "/c/a b");
        assert!(reply.contains("https://sandbox.example/s/abc%20123"));
        assert!(reply.contains("/c/a%20b"));
    }

    #[test]
    fn duplicate_flood_collapses_to_two_lines() {
        let flood = "x\n".repeat(500);
        let reply = format_reply(&result_with_output(&flood), &BTreeSet::new(), &style(), "/c/1");
        let output_lines: Vec<&str> = reply
            .lines()
            .filter(|line| line.trim_start() == "x")
            .collect();
        assert_eq!(output_lines.len(), 2);
        assert!(reply.contains("..."));

        // 같은 결과를 다시 포매팅해도 동일한 본문이 나온다.
        let again = format_reply(&result_with_output(&flood), &BTreeSet::new(), &style(), "/c/1");
        assert_eq!(reply, again);
    }

    #[test]
    fn varied_long_output_keeps_configured_line_count() {
        let varied: String = (0..500).map(|n| format!("line {n}\n")).collect();
        let reply = format_reply(&result_with_output(&varied), &BTreeSet::new(), &style(), "/c/1");
        assert!(reply.contains("line 24"));
        assert!(!reply.contains("line 25\n"));
        assert!(reply.contains("..."));
    }

    #[test]
    fn reply_never_exceeds_ceiling() {
        let mut result = result_with_output(&"a".repeat(50_000));
        result.source = "b".repeat(50_000);
        result.stdin = "c".repeat(50_000);
        result.compiler_info = "d".repeat(50_000);
        let options: BTreeSet<String> = ["--source", "--input", "--date", "--memory", "--time", "--version"]
            .into_iter()
            .map(String::from)
            .collect();

        let mut wide_style = style();
        wide_style.output_char_limit = 50_000;
        let reply = format_reply(&result, &options, &wide_style, "/c/1");
        assert!(reply.len() <= REPLY_CEILING);
    }

    #[test]
    fn over_budget_drops_low_priority_sections_not_output() {
        let mut wide_style = style();
        wide_style.output_line_limit = 100_000;
        wide_style.output_char_limit = 100_000;
        let result = result_with_output(&"a".repeat(20_000));
        let options: BTreeSet<String> = ["--time"].into_iter().map(String::from).collect();

        let reply = format_reply(&result, &options, &wide_style, "/c/1");
        assert!(reply.len() <= REPLY_CEILING);
        assert!(reply.contains("Output:"));
        // 출력이 예산을 채우면 장식 항목은 통째로 빠진다.
        assert!(!reply.contains("Execution Time:"));
        // 푸터는 가장 먼저 예산을 받는다.
        assert!(reply.contains("[submission]"));
    }

    #[test]
    fn failure_message_renders_available_diagnostics() {
        let mut result = result_with_output("partial");
        result.stderr = "boom".to_string();
        result.compiler_info = "warning: unused".to_string();
        let text = failure_message("Your code triggered a runtime error.", &result);
        assert!(text.starts_with("Your code triggered a runtime error."));
        assert!(text.contains("Compiler Info:\n\n    warning: unused\n"));
        assert!(text.contains("Output:\n\n    partial\n"));
        assert!(text.contains("Error Output:\n\n    boom\n"));
    }
}
