//! runpilot library root.
//! Clean Architecture + DDD 계층을 외부에 노출한다.

use std::time::Duration;

use anyhow::{Result, bail};
use tokio::time::sleep;
use tracing::{error, info};

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;

use application::config::Config;
use infrastructure::config::ConfigLoadExt;
use interface::composition::AppComposition;

/// 수신함을 한 번만 처리하고 종료한다.
pub async fn run_once() -> Result<()> {
    let composition = AppComposition::load()?;
    composition.process_inbox_usecase().execute().await
}

/// 감시 모드: 수신함 사이클을 쉬는 시간을 두고 반복한다.
///
/// 사이클 실패는 기록하고 계속하지만, 같은 오류가 연속으로 한도만큼
/// 반복되면 설정/자격 문제로 보고 중단한다.
pub async fn watch(interval_secs: Option<u64>) -> Result<()> {
    let composition = AppComposition::load()?;
    let interval = Duration::from_secs(
        interval_secs.unwrap_or_else(|| composition.config().cycle_interval_secs()),
    );
    let limit = composition.config().max_repeated_failures().max(1);
    info!(interval_secs = interval.as_secs(), "starting inbox watch loop");

    let mut last_failure: Option<String> = None;
    let mut repeats = 0u32;

    loop {
        match composition.process_inbox_usecase().execute().await {
            Ok(()) => {
                last_failure = None;
                repeats = 0;
            }
            Err(err) => {
                let message = format!("{err:#}");
                error!(error = %message, "inbox cycle failed");
                if last_failure.as_deref() == Some(message.as_str()) {
                    repeats += 1;
                } else {
                    last_failure = Some(message);
                    repeats = 1;
                }
                if repeats >= limit {
                    bail!("shutting down after {repeats} identical consecutive failures");
                }
            }
        }
        sleep(interval).await;
    }
}

/// 설정 점검 JSON 출력용 함수.
pub fn inspect_config_pretty_json() -> Result<String> {
    Config::inspect_pretty_json()
}
