//! Infrastructure layer
//! 파일시스템/환경/HTTP에 닿는 구현이 모두 여기에 있다.

pub mod config;
pub mod exec;
pub mod platform;
