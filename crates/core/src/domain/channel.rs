use serde::{Deserialize, Serialize};

/// Client surface a turn arrived on. Each channel threads its own context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Generic web client and the skill-style `POST /` envelope.
    Web,
    /// Voice-assistant webhook (`POST /google`).
    Assistant,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Web, Channel::Assistant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "assistant" | "google" => Ok(Self::Assistant),
            other => Err(format!("unsupported channel `{other}` (expected web|assistant)")),
        }
    }
}
