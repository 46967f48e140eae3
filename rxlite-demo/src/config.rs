use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Demo configuration, loaded from YAML or JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub logging: LoggingConfig,
    pub events: EventsConfig,
    pub array: ArrayConfig,
    pub scratch: ScratchConfig,
    pub promise: PromiseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Synthetic events dispatched by the events walkthrough
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub clicks: Vec<(i32, i32)>,
    pub keys: String,
    pub moves: Vec<(i32, i32)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayConfig {
    pub numbers: Vec<i64>,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Delay before the late value, in milliseconds
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromiseConfig {
    pub delay_ms: u64,
    pub value: String,
    /// Local stand-in for a remote user directory
    pub users: Vec<User>,
    pub lookup: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            clicks: vec![(12, 40), (80, 16)],
            keys: "rx".to_string(),
            moves: vec![(1, 1), (2, 3), (5, 8)],
        }
    }
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            numbers: vec![33, 44, 55, 66, 77],
            posts: vec![
                Post {
                    title: "Post one".to_string(),
                    body: "This is the body".to_string(),
                },
                Post {
                    title: "Post two".to_string(),
                    body: "This is the body".to_string(),
                },
                Post {
                    title: "Post three".to_string(),
                    body: "This is the body".to_string(),
                },
            ],
        }
    }
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self { delay_ms: 3000 }
    }
}

impl Default for PromiseConfig {
    fn default() -> Self {
        Self {
            delay_ms: 3000,
            value: "Promise value received".to_string(),
            users: vec![
                User {
                    login: "octocat".to_string(),
                    name: "The Octocat".to_string(),
                },
                User {
                    login: "hubot".to_string(),
                    name: "Hubot".to_string(),
                },
            ],
            lookup: "octocat".to_string(),
        }
    }
}

impl ScratchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl PromiseConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl DemoConfig {
    /// Load configuration from file; `.json` is parsed as JSON, anything
    /// else as YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        Ok(config)
    }
}
