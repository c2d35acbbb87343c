//! 적용 설정 진단(inspection) 뷰 모델.
//! 비밀값은 해석 여부만 드러내고 값 자체는 절대 싣지 않는다.

use serde::Serialize;

use super::loader::LoadedConfig;
use super::resolve::{resolve_platform_token, resolve_sandbox_key};

#[derive(Debug, Clone, Serialize)]
pub struct ConfigInspection {
    pub searched_paths: Vec<String>,
    pub loaded_paths: Vec<String>,
    pub effective: EffectiveSettings,
    pub platform: EndpointInspection,
    pub sandbox: EndpointInspection,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveSettings {
    pub handle: String,
    pub admin_user: Option<String>,
    pub moderation_group: String,
    pub cycle_interval_secs: u64,
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
    pub output_line_limit: usize,
    pub output_char_limit: usize,
    pub include_error_codes: Vec<String>,
    pub lang_aliases: usize,
    pub spam_phrases: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointInspection {
    pub api_base: Option<String>,
    pub credential_source: Option<String>,
    pub credential_resolved: bool,
}

impl ConfigInspection {
    pub(crate) fn from_loaded(loaded: LoadedConfig) -> Self {
        let config = &loaded.config;
        let style = config.reply_style();

        Self {
            searched_paths: loaded
                .searched_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            loaded_paths: loaded
                .loaded_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            effective: EffectiveSettings {
                handle: config.handle(),
                admin_user: config.admin_user().map(str::to_string),
                moderation_group: config.moderation_group(),
                cycle_interval_secs: config.cycle_interval_secs(),
                poll_interval_secs: config.poll_interval_secs(),
                max_attempts: config.max_attempts(),
                output_line_limit: style.output_line_limit,
                output_char_limit: style.output_char_limit,
                include_error_codes: config.include_error_codes().into_iter().collect(),
                lang_aliases: config.lang_aliases.len(),
                spam_phrases: config.spam_rules().phrases.len(),
            },
            platform: EndpointInspection {
                api_base: config.platform.api_base.clone(),
                credential_source: credential_source(
                    config.platform.token.is_some(),
                    config.platform.token_env.as_deref(),
                ),
                credential_resolved: resolve_platform_token(config).is_ok(),
            },
            sandbox: EndpointInspection {
                api_base: config.sandbox.api_base.clone(),
                credential_source: credential_source(
                    config.sandbox.api_key.is_some(),
                    config.sandbox.api_key_env.as_deref(),
                ),
                credential_resolved: resolve_sandbox_key(config).is_some(),
            },
        }
    }
}

fn credential_source(inline: bool, env_name: Option<&str>) -> Option<String> {
    if inline {
        return Some("inline".to_string());
    }
    env_name.map(|name| format!("env:{name}"))
}
