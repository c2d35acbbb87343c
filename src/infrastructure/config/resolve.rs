//! 비밀값(토큰/키) 해석.
//! 설정 파일에는 값 자체보다 환경변수 이름을 적는 것을 권장한다.

use std::env;

use anyhow::{Result, bail};

use crate::application::config::Config;

/// 플랫폼 API 토큰을 해석한다. 인라인 값이 환경변수보다 우선한다.
pub fn resolve_platform_token(config: &Config) -> Result<String> {
    if let Some(token) = config.platform.token.as_deref()
        && !token.is_empty()
    {
        return Ok(token.to_string());
    }

    if let Some(name) = config.platform.token_env.as_deref()
        && let Ok(value) = env::var(name)
        && !value.is_empty()
    {
        return Ok(value);
    }

    bail!("no platform token configured; set platform.token_env and export the variable")
}

/// 샌드박스 API 키를 해석한다. 키 없는 공개 엔드포인트도 있으므로 선택이다.
pub fn resolve_sandbox_key(config: &Config) -> Option<String> {
    if let Some(key) = config.sandbox.api_key.as_deref()
        && !key.is_empty()
    {
        return Some(key.to_string());
    }

    let name = config.sandbox.api_key_env.as_deref()?;
    env::var(name).ok().filter(|value| !value.is_empty())
}
