//! 샌드박스 실행 결과 엔티티.

/// 실행 서비스가 보고하는 결과 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success,
    CompileError,
    RuntimeError,
    Timeout,
    MemoryError,
    IllegalOperation,
    InternalError,
}

impl ResultCode {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// 설정(include_error_codes)과 대조할 때 쓰는 코드값.
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::CompileError => "compile_error",
            Self::RuntimeError => "runtime_error",
            Self::Timeout => "timeout",
            Self::MemoryError => "memory_error",
            Self::IllegalOperation => "illegal_operation",
            Self::InternalError => "internal_error",
        }
    }
}

/// 제출 한 건의 완료된 실행 결과. 생성 이후에는 읽기 전용이다.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    /// 제출했던 소스 코드 원문.
    pub source: String,
    /// 제출했던 표준 입력.
    pub stdin: String,
    pub stdout: String,
    pub stderr: String,
    /// 컴파일러 진단 메시지. 없으면 빈 문자열.
    pub compiler_info: String,
    pub code: ResultCode,
    pub time_secs: f64,
    pub memory_bytes: u64,
    pub submitted_at: String,
    /// 서비스가 실제로 사용한 언어/버전 라벨.
    pub language_version: String,
    /// 제출 상세 페이지 링크.
    pub link: String,
}

impl SubmissionResult {
    /// 표준 출력과 표준 에러를 이어 붙인 프로그램 출력.
    pub fn combined_output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}
