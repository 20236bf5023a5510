use std::path::{Path, PathBuf};
use std::time::Duration;

use daycare_chat::{AttachmentPolicy, LocalUser, ParticipantRole, default_allowed_types};
use daycare_transport::ReconnectPolicy;
use serde::{Deserialize, Serialize};

// =============================================================================
// File config (figment-deserialized from defaults / daycare.toml / env / CLI)
// =============================================================================
//
//   daycare.toml:    [transport]
//                    url = "wss://chat.example.com"
//
//   env var:         DAYCARE_TRANSPORT__URL=wss://chat.example.com
//
//   (single underscore stays within field names: DAYCARE_USER__ID=parent7)

pub const DEFAULT_CONFIG_FILE: &str = "daycare.toml";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub transport: TransportFileConfig,
    #[serde(default)]
    pub user: UserFileConfig,
    #[serde(default)]
    pub attachments: AttachmentsFileConfig,
    /// JSON file with conversations and messages to start from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<PathBuf>,
}

/// Lives under `[transport]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportFileConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for TransportFileConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

/// Lives under `[user]`. Authentication is handled elsewhere; this is just
/// who the client speaks as.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserFileConfig {
    #[serde(default = "default_user_id")]
    pub id: String,
    #[serde(default = "default_user_name")]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: ParticipantRole,
}

impl Default for UserFileConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
            name: default_user_name(),
            role: default_role(),
        }
    }
}

/// Lives under `[attachments]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttachmentsFileConfig {
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for AttachmentsFileConfig {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_url() -> String {
    "ws://localhost:8080".to_string()
}
fn default_max_reconnect_attempts() -> u32 {
    5
}
fn default_reconnect_delay_ms() -> u64 {
    3000
}
fn default_user_id() -> String {
    "user1".to_string()
}
fn default_user_name() -> String {
    "Me".to_string()
}
fn default_role() -> ParticipantRole {
    ParticipantRole::Parent
}
fn default_max_size_mb() -> u64 {
    10
}

/// Values given on the command line. Unset fields are left out so they do
/// not shadow the layers below.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "TransportOverrides::is_empty")]
    pub transport: TransportOverrides,
    #[serde(skip_serializing_if = "UserOverrides::is_empty")]
    pub user: UserOverrides,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TransportOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TransportOverrides {
    fn is_empty(&self) -> bool {
        self.url.is_none()
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct UserOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ParticipantRole>,
}

impl UserOverrides {
    fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none() && self.role.is_none()
    }
}

/// Build a figment that layers: defaults → daycare.toml → DAYCARE_* env vars → CLI flags.
///
/// Env vars use double-underscore for nesting into sections:
///   `DAYCARE_TRANSPORT__URL=ws://host:9000`  →  `transport.url = "ws://host:9000"`
///   `DAYCARE_ATTACHMENTS__MAX_SIZE_MB=25`  →  `attachments.max_size_mb = 25`
pub fn load_config(config_file: Option<&Path>, cli: &CliOverrides) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    let file = config_file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed("DAYCARE_").split("__"))
        .merge(Serialized::defaults(cli))
}

// =============================================================================
// Runtime views
// =============================================================================

impl FileConfig {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.transport.max_reconnect_attempts,
            delay: Duration::from_millis(self.transport.reconnect_delay_ms),
        }
    }

    pub fn local_user(&self) -> LocalUser {
        LocalUser {
            id: self.user.id.clone(),
            name: self.user.name.clone(),
            role: self.user.role,
        }
    }

    pub fn attachment_policy(&self) -> AttachmentPolicy {
        AttachmentPolicy {
            max_size_mb: self.attachments.max_size_mb,
            allowed_types: self.attachments.allowed_types.clone(),
        }
    }
}
