//! Line-oriented settings file.
//!
//! ```text
//! # comment
//! set capture.packet.tls off
//! set capture.limit 500
//! set sip.noincomplete on
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::call::RegistryOptions;
use crate::dissect::{DissectorToggles, ProtocolId};

const PACKET_PREFIX: &str = "capture.packet.";
const KEY_LIMIT: &str = "capture.limit";
const KEY_KEYFILE: &str = "capture.keyfile";
const KEY_NO_INCOMPLETE: &str = "sip.noincomplete";
const KEY_XCID: &str = "sip.xcid";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected `set <key> <value>`, got `{content}`")]
    InvalidLine { line: usize, content: String },
    #[error("line {line}: invalid value `{value}` for {key}")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    packets: BTreeMap<ProtocolId, bool>,
    /// Maximum number of dialogs kept in memory.
    pub limit: Option<usize>,
    /// PEM private key for the TLS stage.
    pub keyfile: Option<PathBuf>,
    /// Ignore dialogs first seen through a response.
    pub no_incomplete: bool,
    /// Link call legs through X-Call-ID.
    pub x_call_id: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            packets: ProtocolId::ALL.into_iter().map(|id| (id, true)).collect(),
            limit: None,
            keyfile: None,
            no_incomplete: false,
            x_call_id: false,
        }
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Some(true),
        "off" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn switch(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn split_token(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim()),
        None => (text, ""),
    }
}

impl Settings {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();
        for (number, raw) in text.lines().enumerate() {
            let line = number + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (directive, rest) = split_token(trimmed);
            if directive != "set" {
                warn!(line, directive, "ignoring unsupported settings directive");
                continue;
            }
            // The value runs to the end of the line.
            let (key, value) = split_token(rest);
            if key.is_empty() || value.is_empty() {
                return Err(ConfigError::InvalidLine {
                    line,
                    content: trimmed.to_string(),
                });
            }
            settings.apply(line, key, value)?;
        }
        Ok(settings)
    }

    fn apply(&mut self, line: usize, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            line,
            key: key.to_string(),
            value: value.to_string(),
        };
        if let Some(name) = key.strip_prefix(PACKET_PREFIX) {
            let Some(id) = ProtocolId::from_name(name) else {
                warn!(line, key, "ignoring unknown protocol");
                return Ok(());
            };
            self.packets.insert(id, parse_switch(value).ok_or_else(invalid)?);
            return Ok(());
        }
        match key {
            KEY_LIMIT => {
                let limit: usize = value.parse().map_err(|_| invalid())?;
                self.limit = (limit > 0).then_some(limit);
            }
            KEY_KEYFILE => self.keyfile = Some(PathBuf::from(value)),
            KEY_NO_INCOMPLETE => self.no_incomplete = parse_switch(value).ok_or_else(invalid)?,
            KEY_XCID => self.x_call_id = parse_switch(value).ok_or_else(invalid)?,
            _ => warn!(line, key, "ignoring unknown setting"),
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_config_string()).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_config_string(&self) -> String {
        let mut out = String::new();
        for (id, enabled) in &self.packets {
            let _ = writeln!(out, "set {PACKET_PREFIX}{} {}", id.name(), switch(*enabled));
        }
        if let Some(limit) = self.limit {
            let _ = writeln!(out, "set {KEY_LIMIT} {limit}");
        }
        if let Some(keyfile) = &self.keyfile {
            let _ = writeln!(out, "set {KEY_KEYFILE} {}", keyfile.display());
        }
        let _ = writeln!(out, "set {KEY_NO_INCOMPLETE} {}", switch(self.no_incomplete));
        let _ = writeln!(out, "set {KEY_XCID} {}", switch(self.x_call_id));
        out
    }

    pub fn is_enabled(&self, id: ProtocolId) -> bool {
        self.packets.get(&id).copied().unwrap_or(true)
    }

    pub fn set_enabled(&mut self, id: ProtocolId, enabled: bool) {
        self.packets.insert(id, enabled);
    }

    /// Shared toggles initialised from these settings.
    pub fn toggles(&self) -> Arc<DissectorToggles> {
        let toggles = Arc::new(DissectorToggles::default());
        self.apply_toggles(&toggles);
        toggles
    }

    pub fn apply_toggles(&self, toggles: &DissectorToggles) {
        for id in ProtocolId::ALL {
            toggles.set_enabled(id, self.is_enabled(id));
        }
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            limit: self.limit,
            only_requests: self.no_incomplete,
            x_call_id: self.x_call_id,
        }
    }
}
