//! Application layer
//! 포트 뒤의 구현을 알지 못한 채 수신함 처리 흐름을 조율한다.

pub mod config;
pub mod ports;
pub mod usecases;
