use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const GENESIS_HASH: &str = "genesis";

/// Append-only JSONL audit log with a SHA-256 hash chain.
///
/// Every line carries `prev_hash`, the hash of the previous raw line (or
/// `"genesis"` for the first), plus an RFC 3339 `ts`.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

/// Anchor recording the chain head at a known entry count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub audit_file: String,
    pub entries: u64,
    pub chain_head: String,
    pub created_at: String,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record; returns the hash of the written line.
    pub fn append<T: Serialize>(&self, record: &T) -> Result<String> {
        let mut entry = serde_json::to_value(record)?;
        let Some(obj) = entry.as_object_mut() else {
            bail!("audit record must serialize to a JSON object");
        };

        let prev_hash = match self.read_lines()? {
            Some(lines) => lines
                .iter()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| line_hash(l))
                .unwrap_or_else(|| GENESIS_HASH.to_string()),
            None => GENESIS_HASH.to_string(),
        };
        obj.insert("prev_hash".into(), serde_json::Value::String(prev_hash));
        obj.insert(
            "ts".into(),
            serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
        );

        let line = serde_json::to_string(&entry)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("cannot open audit {}", self.path.display()))?;
        writeln!(file, "{line}")
            .with_context(|| format!("cannot write audit {}", self.path.display()))?;

        Ok(line_hash(&line))
    }

    /// Check the whole chain; returns the number of entries.
    pub fn verify(&self) -> Result<u64> {
        let lines = self.require_lines()?;
        let mut prev = GENESIS_HASH.to_string();
        let mut count = 0u64;
        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let claimed = claimed_prev_hash(line)
                .with_context(|| format!("invalid JSON at line {}", i + 1))?;
            if claimed != prev {
                bail!("hash chain broken at entry {count}: expected '{prev}', got '{claimed}'");
            }
            prev = line_hash(line);
            count += 1;
        }
        Ok(count)
    }

    /// Verify the chain, then write a checkpoint of its head.
    pub fn checkpoint(&self, checkpoint_path: &Path) -> Result<Checkpoint> {
        let entries = self.verify()?;
        let chain_head = self
            .require_lines()?
            .iter()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(|l| line_hash(l))
            .unwrap_or_else(|| GENESIS_HASH.to_string());

        let checkpoint = Checkpoint {
            audit_file: self.path.display().to_string(),
            entries,
            chain_head,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&checkpoint)?;
        std::fs::write(checkpoint_path, json)
            .with_context(|| format!("cannot write checkpoint {}", checkpoint_path.display()))?;
        Ok(checkpoint)
    }

    /// True if the first `entries` lines still chain to the recorded head.
    pub fn verify_checkpoint(&self, checkpoint_path: &Path) -> Result<bool> {
        let content = std::fs::read_to_string(checkpoint_path)
            .with_context(|| format!("cannot read checkpoint {}", checkpoint_path.display()))?;
        let checkpoint: Checkpoint = serde_json::from_str(&content)
            .with_context(|| format!("{}: invalid checkpoint JSON", checkpoint_path.display()))?;

        let mut prev = GENESIS_HASH.to_string();
        let mut count = 0u64;
        for line in self.require_lines()?.iter().filter(|l| !l.trim().is_empty()) {
            if count == checkpoint.entries {
                break;
            }
            match claimed_prev_hash(line) {
                Ok(claimed) if claimed == prev => {}
                _ => return Ok(false),
            }
            prev = line_hash(line);
            count += 1;
        }
        Ok(count == checkpoint.entries && prev == checkpoint.chain_head)
    }

    fn read_lines(&self) -> Result<Option<Vec<String>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read audit {}", self.path.display()))?;
        Ok(Some(content.lines().map(str::to_string).collect()))
    }

    fn require_lines(&self) -> Result<Vec<String>> {
        self.read_lines()?
            .with_context(|| format!("no audit log at {}", self.path.display()))
    }
}

fn line_hash(line: &str) -> String {
    format!("sha256:{:x}", Sha256::digest(line.as_bytes()))
}

fn claimed_prev_hash(line: &str) -> Result<String> {
    let entry: serde_json::Value = serde_json::from_str(line)?;
    Ok(entry
        .get("prev_hash")
        .and_then(serde_json::Value::as_str)
        .unwrap_or(GENESIS_HASH)
        .to_string())
}
