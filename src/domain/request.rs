//! 멘션 코멘트 파싱 모듈.
//! 원문에서 (언어 지정자, 옵션, 소스 블록, 표준 입력 블록)을 추출한다.
//!
//! 단일 정규식 대신 줄 단위 2단계 스캐너로 동작한다: 1단계에서 `+핸들`
//! 멘션과 인자 줄을 찾고, 2단계에서 들여쓴 블록을 상태 기계로 수집한다.

use std::collections::BTreeSet;

use thiserror::Error;

/// 본문이 멘션+들여쓴 코드 블록 형태를 갖추지 못했을 때의 파싱 실패.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("comment body does not match the mention + indented code block shape")]
pub struct MalformedRequest;

/// 파싱된 컴파일 요청. 파싱이 성공하면 `source`는 항상 비어 있지 않다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// 옵션을 제외한 언어 지정자("python 3" 등).
    pub language_spec: String,
    /// `--source` 같은 플래그 집합. 순서는 의미가 없다.
    pub options: BTreeSet<String>,
    /// 들여쓰기 한 단계를 제거한 소스 코드.
    pub source: String,
    /// Input:/Stdin: 블록. 없으면 빈 문자열.
    pub stdin: String,
}

impl ParsedRequest {
    pub fn has_option(&self, flag: &str) -> bool {
        self.options.contains(flag)
    }
}

/// 블록 들여쓰기 단위. 첫 블록 줄에서 결정되며 이후 줄은 같은 단위를 써야 한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndentUnit {
    Spaces,
    Tab,
}

impl IndentUnit {
    fn of(line: &str) -> Option<Self> {
        if line.starts_with("    ") {
            Some(Self::Spaces)
        } else if line.starts_with('\t') {
            Some(Self::Tab)
        } else {
            None
        }
    }

    fn strip<'a>(self, line: &'a str) -> Option<&'a str> {
        match self {
            Self::Spaces => line.strip_prefix("    "),
            Self::Tab => line.strip_prefix('\t'),
        }
    }
}

/// 본문에서 `+핸들` 멘션(대소문자 무시)을 찾아 요청을 파싱한다.
///
/// 멘션 뒤 같은 줄의 나머지가 인자 문자열이고, 공백 줄들을 지나 4칸
/// 들여쓰기(또는 탭 1개) 블록이 소스가 된다. 블록이 따라오지 않는 멘션은
/// 건너뛰고 다음 멘션을 시도한다.
pub fn parse(body: &str, handle: &str) -> Result<ParsedRequest, MalformedRequest> {
    let mention = format!("+{handle}");
    let lines: Vec<&str> = body.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        let Some(col) = find_ignore_ascii_case(line, &mention) else {
            continue;
        };
        let args = line[col + mention.len()..].trim();

        if let Some((source, stdin)) = read_blocks(&lines[idx + 1..]) {
            let (language_spec, options) = split_args(args);
            return Ok(ParsedRequest {
                language_spec,
                options,
                source,
                stdin,
            });
        }
    }

    Err(MalformedRequest)
}

/// 본문에 `+핸들` 멘션이 있는지만 본다. 블록 유무는 확인하지 않으므로
/// 처리 대상 선별에만 쓰고, 실제 추출은 [`parse`]가 맡는다.
pub fn contains_mention(body: &str, handle: &str) -> bool {
    let mention = format!("+{handle}");
    body.lines()
        .any(|line| find_ignore_ascii_case(line, &mention).is_some())
}

/// 인자 문자열을 언어 지정자와 옵션 플래그로 분리한다.
///
/// 공백 뒤 `-`가 처음 나타나는 지점까지가 언어 지정자이고, 그 `-`부터는
/// 공백 기준으로 토큰화해 옵션으로 삼는다. 구분자가 없으면 전체가 언어다.
pub fn split_args(args: &str) -> (String, BTreeSet<String>) {
    match args.find(" -") {
        Some(pos) => {
            let language = args[..pos].trim().to_string();
            let options = args[pos + 1..]
                .split_whitespace()
                .map(str::to_string)
                .collect();
            (language, options)
        }
        None => (args.trim().to_string(), BTreeSet::new()),
    }
}

/// 멘션 줄 이후의 줄들에서 소스 블록과 선택적 입력 블록을 수집한다.
/// 탭/스페이스가 줄마다 섞인 블록은 불명확한 입력으로 보고 실패시킨다.
fn read_blocks(lines: &[&str]) -> Option<(String, String)> {
    let mut idx = skip_blank(lines, 0);
    let unit = IndentUnit::of(lines.get(idx).copied()?)?;

    let (source_lines, consumed) = read_block(&lines[idx..], unit)?;
    if source_lines.is_empty() {
        return None;
    }
    idx += consumed;

    let mut stdin_lines = Vec::new();
    idx = skip_blank(lines, idx);
    if lines.get(idx).is_some_and(|line| is_input_marker(line)) {
        idx += 1;
        idx = skip_blank(lines, idx);
        if let Some(line) = lines.get(idx) {
            match IndentUnit::of(line) {
                Some(found) if found == unit => {
                    let (block, _) = read_block(&lines[idx..], unit)?;
                    stdin_lines = block;
                }
                // 입력 블록이 다른 단위로 들여쓰였으면 혼용으로 본다.
                Some(_) => return None,
                None => {}
            }
        }
    }

    Some((source_lines.join("\n"), stdin_lines.join("\n")))
}

/// 들여쓴 블록 하나를 읽어 (들여쓰기 제거된 줄들, 소비한 줄 수)를 돌려준다.
///
/// 블록은 들여쓰지 않은 비공백 줄에서 끝난다. 내부의 공백 줄은 뒤에 들여쓴
/// 줄이 더 나올 때만 빈 줄로 포함되고, 끝자락의 공백 줄 묶음은 버린다.
fn read_block(lines: &[&str], unit: IndentUnit) -> Option<(Vec<String>, usize)> {
    let mut out = Vec::new();
    let mut pending_blanks = 0usize;
    let mut idx = 0;
    let mut consumed = 0;

    while let Some(line) = lines.get(idx) {
        if let Some(rest) = unit.strip(line) {
            for _ in 0..pending_blanks {
                out.push(String::new());
            }
            pending_blanks = 0;
            out.push(rest.to_string());
            idx += 1;
            consumed = idx;
        } else if line.trim().is_empty() {
            pending_blanks += 1;
            idx += 1;
        } else if IndentUnit::of(line).is_some() {
            // 블록 중간에 다른 들여쓰기 단위가 나타났다.
            return None;
        } else {
            break;
        }
    }

    Some((out, consumed))
}

fn skip_blank(lines: &[&str], mut idx: usize) -> usize {
    while lines.get(idx).is_some_and(|line| line.trim().is_empty()) {
        idx += 1;
    }
    idx
}

/// "Input:" / "Stdin:" 표식 줄 여부. 대소문자를 무시하고 콜론은 선택이다.
fn is_input_marker(line: &str) -> bool {
    let trimmed = line.trim();
    let word = trimmed.strip_suffix(':').unwrap_or(trimmed);
    word.eq_ignore_ascii_case("input") || word.eq_ignore_ascii_case("stdin")
}

/// ASCII 대소문자를 무시하고 부분 문자열 위치를 찾는다.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANDLE: &str = "testbot";

    #[test]
    fn parses_mention_surrounded_by_noise() {
        let body = "This sentence should not be included. +testbot python 3\n\n\
                    \x20   print(\"Test\")\n\n\
                    This sentence should not be included.";
        let req = parse(body, HANDLE).unwrap();
        assert_eq!(req.language_spec, "python 3");
        assert!(req.options.is_empty());
        assert_eq!(req.source, "print(\"Test\")");
        assert_eq!(req.stdin, "");
    }

    #[test]
    fn parses_multiline_source_with_input_and_options() {
        let body = "+testbot python 3 --time\n\n\
                    \x20   \n        x = input()\n    print(\"x\")\n    \n\n\n\
                    Input: \n\n    5\n    6\n    7";
        let req = parse(body, HANDLE).unwrap();
        assert_eq!(req.language_spec, "python 3");
        assert!(req.has_option("--time"));
        // 첫 줄의 추가 들여쓰기는 한 단계 제거 후에도 유지된다.
        assert_eq!(req.source, "    x = input()\nprint(\"x\")\n");
        assert_eq!(req.stdin, "5\n6\n7");
    }

    #[test]
    fn mention_is_case_insensitive() {
        let body = "+TestBot ruby\n\n    puts 1\n";
        let req = parse(body, HANDLE).unwrap();
        assert_eq!(req.language_spec, "ruby");
        assert_eq!(req.source, "puts 1");
    }

    #[test]
    fn missing_code_block_fails() {
        let body = "+testbot Java\n\n Source code missing\n\n";
        assert_eq!(parse(body, HANDLE), Err(MalformedRequest));
    }

    #[test]
    fn mention_without_sigil_fails() {
        let body = "testbot python\n\n    print(1)\n";
        assert_eq!(parse(body, HANDLE), Err(MalformedRequest));
    }

    #[test]
    fn tab_indented_block_is_accepted() {
        let body = "+testbot c\n\n\tint main() {}\n\treturn 0;\n";
        let req = parse(body, HANDLE).unwrap();
        assert_eq!(req.source, "int main() {}\nreturn 0;");
    }

    #[test]
    fn mixed_indent_units_fail() {
        let body = "+testbot c\n\n    int x;\n\tint y;\n";
        assert_eq!(parse(body, HANDLE), Err(MalformedRequest));
    }

    #[test]
    fn interior_blank_lines_stay_in_block() {
        let body = "+testbot python\n\n    a = 1\n\n    b = 2\n\nnoise";
        let req = parse(body, HANDLE).unwrap();
        assert_eq!(req.source, "a = 1\n\nb = 2");
    }

    #[test]
    fn stdin_marker_variants() {
        for marker in ["Input:", "input", "STDIN:", "Stdin"] {
            let body = format!("+testbot python\n\n    x\n\n{marker}\n\n    data\n");
            let req = parse(&body, HANDLE).unwrap();
            assert_eq!(req.stdin, "data", "marker {marker:?}");
        }
    }

    #[test]
    fn marker_without_block_yields_empty_stdin() {
        let body = "+testbot python\n\n    x\n\nInput:\n\nno block here";
        let req = parse(body, HANDLE).unwrap();
        assert_eq!(req.source, "x");
        assert_eq!(req.stdin, "");
    }

    #[test]
    fn later_mention_with_block_wins_over_bare_mention() {
        let body = "+testbot first has no block\nplain text\n\
                    +testbot python\n\n    ok\n";
        let req = parse(body, HANDLE).unwrap();
        assert_eq!(req.language_spec, "python");
        assert_eq!(req.source, "ok");
    }

    #[test]
    fn split_args_is_deterministic() {
        let (lang, opts) = split_args("python 3 --time");
        assert_eq!(lang, "python 3");
        assert_eq!(opts, BTreeSet::from(["--time".to_string()]));

        let (lang, opts) = split_args("Foo");
        assert_eq!(lang, "Foo");
        assert!(opts.is_empty());

        let (lang, opts) = split_args("c99 --source --input");
        assert_eq!(lang, "c99");
        assert_eq!(
            opts,
            BTreeSet::from(["--source".to_string(), "--input".to_string()])
        );
    }
}
