//! Domain layer
//! 파싱/포매팅/스팸 판정 규칙을 외부 의존성 없이 표현한다.

pub mod format;
pub mod item;
pub mod reply;
pub mod request;
pub mod spam;
pub mod submission;
