use serde::Serialize;

const USED_AT_HEIGHT: &str = "used_at_height_";

/// Persisted marker written by the first successful override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageFlag {
    pub height: i64,
}

impl UsageFlag {
    pub fn at(height: i64) -> Self {
        Self { height }
    }

    /// Stored value: `used_at_height_<h>`.
    pub fn encode(&self) -> Vec<u8> {
        format!("{USED_AT_HEIGHT}{}", self.height).into_bytes()
    }

    /// Recover the height from a stored value, if it is well formed.
    pub fn decode(raw: &[u8]) -> Option<Self> {
        let s = std::str::from_utf8(raw).ok()?;
        let height = s.strip_prefix(USED_AT_HEIGHT)?.parse().ok()?;
        Some(Self { height })
    }
}

/// Lifecycle of the override capability. `Used` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum OverrideState {
    Unused,
    Used {
        /// Height recorded in the flag; `None` if the stored value is unreadable.
        height: Option<i64>,
    },
}

impl OverrideState {
    /// Derive the state from the raw flag value. Presence alone means `Used`.
    pub fn from_flag(raw: Option<&[u8]>) -> Self {
        match raw {
            None => OverrideState::Unused,
            Some(bytes) => OverrideState::Used {
                height: UsageFlag::decode(bytes).map(|f| f.height),
            },
        }
    }

    pub fn is_used(&self) -> bool {
        matches!(self, OverrideState::Used { .. })
    }
}
