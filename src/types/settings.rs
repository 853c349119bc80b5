use serde::{Deserialize, Serialize};

/// Top-level client settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientSettings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub account: AccountSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
}

/// Where the record backend lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_string(),
            timeout_secs: 30,
        }
    }
}

/// The signed-in account. Records created by this client are owned by `user_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccountSettings {
    pub user_id: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// List fetching behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetchSettings {
    /// Page size used when reading a full list.
    pub batch_size: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}
