//! 게시된 컴파일 회신에 대한 사후 스팸 휴리스틱.
//! 결과는 모더레이터 알림에만 쓰이고 회신 자체를 막지는 않는다.

use std::collections::BTreeSet;

use crate::domain::reply::CompiledReply;

/// 개별 휴리스틱이 내놓는 판정 라벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SpamTrigger {
    ExcessiveLineBreaks,
    ExcessiveCharacterCount,
    SpamPhrase,
    IllegalSystemCall,
}

impl SpamTrigger {
    pub fn label(self) -> &'static str {
        match self {
            Self::ExcessiveLineBreaks => "excessive line breaks",
            Self::ExcessiveCharacterCount => "excessive character count",
            Self::SpamPhrase => "spam phrase detected",
            Self::IllegalSystemCall => "illegal system call detected",
        }
    }
}

/// 스팸 판정 임계값과 문구 목록.
#[derive(Debug, Clone)]
pub struct SpamRules {
    pub line_limit: usize,
    pub char_limit: usize,
    /// 소스+출력에서 대소문자 무시로 찾는 문구들.
    pub phrases: Vec<String>,
    /// 표준 에러에서 권한 거부를 나타내는 표식 문자열.
    pub denied_indicator: String,
}

/// 회신 하나를 검사해 걸린 휴리스틱 전부를 돌려준다. 부수 효과가 없다.
pub fn scan(reply: &CompiledReply, rules: &SpamRules) -> BTreeSet<SpamTrigger> {
    let mut triggers = BTreeSet::new();
    let output = reply.result.combined_output();

    if output.lines().count() > rules.line_limit {
        triggers.insert(SpamTrigger::ExcessiveLineBreaks);
    }
    if output.len() > rules.char_limit {
        triggers.insert(SpamTrigger::ExcessiveCharacterCount);
    }

    let haystack = format!("{}{}", reply.result.source, output).to_lowercase();
    if rules
        .phrases
        .iter()
        .any(|phrase| !phrase.is_empty() && haystack.contains(&phrase.to_lowercase()))
    {
        triggers.insert(SpamTrigger::SpamPhrase);
    }

    if !rules.denied_indicator.is_empty() && reply.result.stderr.contains(&rules.denied_indicator) {
        triggers.insert(SpamTrigger::IllegalSystemCall);
    }

    triggers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{InboxItem, ItemKind};
    use crate::domain::submission::{ResultCode, SubmissionResult};

    fn rules() -> SpamRules {
        SpamRules {
            line_limit: 1_000,
            char_limit: 10_000,
            phrases: vec!["buy cheap widgets".to_string()],
            denied_indicator: "Permission denied".to_string(),
        }
    }

    fn reply_with(stdout: &str, stderr: &str, source: &str) -> CompiledReply {
        let result = SubmissionResult {
            source: source.to_string(),
            stdin: String::new(),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            compiler_info: String::new(),
            code: ResultCode::Success,
            time_secs: 0.0,
            memory_bytes: 0,
            submitted_at: String::new(),
            language_version: String::new(),
            link: String::new(),
        };
        CompiledReply::new(
            "Output:\n\n    ...\n".to_string(),
            result,
            InboxItem {
                id: "c1".to_string(),
                author: Some("someone".to_string()),
                body: String::new(),
                kind: ItemKind::Comment {
                    permalink: "/c/c1".to_string(),
                    group: "programming".to_string(),
                },
            },
        )
    }

    #[test]
    fn line_flood_triggers_line_breaks_only() {
        let reply = reply_with(&"\n".repeat(1_001), "", "");
        let triggers = scan(&reply, &rules());
        assert_eq!(triggers, BTreeSet::from([SpamTrigger::ExcessiveLineBreaks]));
    }

    #[test]
    fn character_flood_triggers_char_count_only() {
        let reply = reply_with(&"a".repeat(10_001), "", "");
        let triggers = scan(&reply, &rules());
        assert_eq!(
            triggers,
            BTreeSet::from([SpamTrigger::ExcessiveCharacterCount])
        );
    }

    #[test]
    fn heuristics_report_independently() {
        let mut spam = "a".repeat(10_001);
        spam.push_str("Buy Cheap Widgets");
        let reply = reply_with(&spam, "", "");
        let triggers = scan(&reply, &rules());
        assert_eq!(
            triggers,
            BTreeSet::from([
                SpamTrigger::ExcessiveCharacterCount,
                SpamTrigger::SpamPhrase
            ])
        );
    }

    #[test]
    fn phrase_in_source_counts_too() {
        let reply = reply_with("", "", "print('buy cheap widgets')");
        assert!(scan(&reply, &rules()).contains(&SpamTrigger::SpamPhrase));
    }

    #[test]
    fn denied_syscall_indicator_in_stderr() {
        let reply = reply_with("", "'rm -rf /*': Permission denied", "");
        assert!(scan(&reply, &rules()).contains(&SpamTrigger::IllegalSystemCall));
    }

    #[test]
    fn clean_reply_triggers_nothing() {
        let reply = reply_with("Hello World\n", "", "print('hi')");
        assert!(scan(&reply, &rules()).is_empty());
    }
}
