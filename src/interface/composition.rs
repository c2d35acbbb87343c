//! 애플리케이션 조립(composition root) 모듈.

use anyhow::Result;

use crate::application::config::Config;
use crate::application::usecases::process_inbox::ProcessInboxUseCase;
use crate::infrastructure::config::ConfigLoadExt;
use crate::infrastructure::exec::SandboxClient;
use crate::infrastructure::platform::ForumClient;

/// 실행 시점 의존성을 한 곳에서 조립하는 컨테이너.
pub struct AppComposition {
    config: Config,
    exec: SandboxClient,
    platform: ForumClient,
}

impl AppComposition {
    /// 설정을 로딩하고 두 HTTP 클라이언트를 조립한다.
    pub fn load() -> Result<Self> {
        let config = Config::load()?;
        let exec = SandboxClient::from_config(&config)?;
        let platform = ForumClient::from_config(&config)?;
        Ok(Self {
            config,
            exec,
            platform,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 수신함 처리 유스케이스를 생성한다.
    pub fn process_inbox_usecase(&self) -> ProcessInboxUseCase<'_> {
        ProcessInboxUseCase {
            config: &self.config,
            exec: &self.exec,
            platform: &self.platform,
        }
    }
}
