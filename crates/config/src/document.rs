//! Desired-state config documents.
//!
//! A config document is the JSON body submitted to the control plane's
//! automation config endpoints. The model types only the sections the
//! client rewrites during retargeting; every other field rides along in a
//! flattened map so a loaded document is resubmitted with its full
//! content intact.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::target::TargetHost;

/// Placeholder token replaced by the target hostname during retargeting.
pub const HOSTNAME_PLACEHOLDER: &str = "AGENT_HOSTNAME";

/// A desired-state config document for one automation group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationConfig {
    /// Goal version counter. Maintained by the control plane; clients
    /// never set it, but it round-trips when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    /// Monitoring agent entries, one per monitored host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_versions: Option<Vec<AgentVersion>>,

    /// Backup agent entries, one per backed-up host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_versions: Option<Vec<AgentVersion>>,

    /// Managed process entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processes: Option<Vec<ProcessConfig>>,

    /// Kerberos principal template for the automation agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kerberos_principal: Option<String>,

    /// Authentication section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSection>,

    /// Sections the client never rewrites (options, mongoDbVersions,
    /// replicaSets, sharding, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One monitoring or backup agent entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentVersion {
    /// Host the agent runs on.
    pub hostname: String,

    /// Remaining agent fields (name, baseUrl, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One managed process entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessConfig {
    /// Host the process runs on.
    pub hostname: String,

    /// Optional display alias for the host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Remaining process fields (name, processType, version, args2_6, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Authentication section of a config document.
///
/// `usersWanted` is required whenever the section is present: an auth
/// section without it is malformed and rejected at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSection {
    /// Principal template for the automation user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_user: Option<String>,

    /// Users the automation should ensure exist.
    pub users_wanted: Vec<AuthUser>,

    /// Remaining auth fields (disabled, key, autoPwd, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One wanted auth user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// User name template (may embed the hostname placeholder).
    pub user: String,

    /// Remaining user fields (db, roles, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AutomationConfig {
    /// Load a config document from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        Self::from_json(&path.display().to_string(), &content)
    }

    /// Parse a config document from a JSON string.
    ///
    /// `document` names the source in errors: a file path, or a label for
    /// in-memory documents.
    pub fn from_json(document: &str, content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::malformed_config(document, e.to_string()))?;
        debug!(document = %document, "Loaded config document");
        Ok(config)
    }

    /// Rewrite the document in place so every host-bound field points at
    /// `target`, returning the document for chaining.
    ///
    /// Monitoring agent, backup agent, and process entries get their
    /// `hostname` overwritten; a process `alias` is overwritten too when
    /// present and non-empty. The kerberos principal, the auth auto user,
    /// and the wanted auth users get the `AGENT_HOSTNAME` token replaced
    /// inside the field, leaving surrounding template text alone. Absent
    /// sections are skipped. Retargeting twice with the same host changes
    /// nothing further.
    pub fn retarget(&mut self, target: &TargetHost) -> &mut Self {
        let hostname = target.as_str();

        if let Some(entries) = self.monitoring_versions.as_mut() {
            for entry in entries {
                entry.hostname = hostname.to_string();
            }
        }

        if let Some(entries) = self.backup_versions.as_mut() {
            for entry in entries {
                entry.hostname = hostname.to_string();
            }
        }

        if let Some(processes) = self.processes.as_mut() {
            for process in processes {
                process.hostname = hostname.to_string();
                if process.alias.as_deref().is_some_and(|alias| !alias.is_empty()) {
                    process.alias = Some(hostname.to_string());
                }
            }
        }

        if let Some(principal) = self.kerberos_principal.as_mut() {
            *principal = principal.replace(HOSTNAME_PLACEHOLDER, hostname);
        }

        if let Some(auth) = self.auth.as_mut() {
            if let Some(auto_user) = auth.auto_user.as_mut() {
                *auto_user = auto_user.replace(HOSTNAME_PLACEHOLDER, hostname);
            }
            for user in &mut auth.users_wanted {
                user.user = user.user.replace(HOSTNAME_PLACEHOLDER, hostname);
            }
        }

        debug!(host = %target, "Retargeted config document");
        self
    }

    /// Serialize the document to a JSON value for submission.
    pub fn to_json_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
