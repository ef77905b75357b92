//! 统一配置中心
//!
//! 加载顺序：内置默认值 -> 可选配置文件（`LIVEDESK_CONFIG_FILE`，按扩展名识别
//! toml/yaml/json）-> 环境变量 `LIVEDESK_*`，嵌套字段用 `__` 分隔，
//! 例如 `LIVEDESK_SERVER__PORT=9000`。

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const ENV_PREFIX: &str = "LIVEDESK_";
pub const CONFIG_FILE_ENV: &str = "LIVEDESK_CONFIG_FILE";

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub broadcast: BroadcastConfig,
    #[validate(nested)]
    pub agent: AgentConfig,
    #[validate(nested)]
    pub relay: RelayConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// 广播器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BroadcastConfig {
    /// 进程内广播通道容量，消费过慢的连接会丢弃超出部分
    #[validate(range(min = 1, max = 1_000_000))]
    pub capacity: usize,
}

/// 客服配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AgentConfig {
    /// 未显式给出角色时，用这个标识判断调用方是否为客服
    #[validate(length(min = 1))]
    pub identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RelayConfig {
    /// 加入/离开通知的发送者名称
    #[validate(length(min = 1))]
    pub system_label: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 5000,
                cors_origins: vec!["*".into()],
            },
            broadcast: BroadcastConfig { capacity: 1024 },
            agent: AgentConfig {
                identifier: "liveagent".into(),
            },
            relay: RelayConfig {
                system_label: "System".into(),
            },
        }
    }
}

impl AppConfig {
    /// 组装配置来源，调用方可以在此基础上继续 merge
    pub fn figment() -> Figment {
        let mut fig = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                fig = fig.merge(Yaml::file(path));
            } else if path.ends_with(".json") {
                fig = fig.merge(Json::file(path));
            } else {
                fig = fig.merge(Toml::file(path));
            }
        }
        fig.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Extract(#[from] Box<figment::Error>),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}
