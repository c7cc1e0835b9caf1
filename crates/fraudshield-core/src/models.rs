use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Static risk label attached to a transaction
///
/// Comes with the data; nothing in here computes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Upper-case badge text
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn all() -> [RiskLevel; 3] {
        [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low]
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(Error::InvalidValue(format!("unknown risk level '{}'", other))),
        }
    }
}

/// One account event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub merchant: String,
    /// Currency-formatted display text ("$47.99")
    pub amount: String,
    /// Display date ("Feb 14")
    pub date: String,
    pub risk: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub pending: bool,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        merchant: impl Into<String>,
        amount: impl Into<String>,
        date: impl Into<String>,
        risk: RiskLevel,
    ) -> Self {
        Self {
            id: id.into(),
            merchant: merchant.into(),
            amount: amount.into(),
            date: date.into(),
            risk,
            time: None,
            category: None,
            pending: false,
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn pending(mut self) -> Self {
        self.pending = true;
        self
    }
}

/// Severity of an alert as the store tracks it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    High,
    Medium,
    Low,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::High => "high",
            AlertSeverity::Medium => "medium",
            AlertSeverity::Low => "low",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fraud/security notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub read: bool,
}

impl Alert {
    pub fn new(
        id: impl Into<String>,
        severity: AlertSeverity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            title: title.into(),
            description: description.into(),
            read: false,
        }
    }
}

/// User preference flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub protection_enabled: bool,
    pub push_notifications: bool,
    pub email_alerts: bool,
    pub is_premium: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            protection_enabled: true,
            push_notifications: true,
            email_alerts: true,
            is_premium: false,
        }
    }
}

/// The record written to durable storage
///
/// Every field is optional on read: a record written by an older build that
/// lacks a flag leaves that flag at its current value. Unknown fields are
/// ignored. Writes always carry all four flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSettings {
    #[serde(default)]
    pub protection_enabled: Option<bool>,
    #[serde(default)]
    pub push_notifications: Option<bool>,
    #[serde(default)]
    pub email_alerts: Option<bool>,
    #[serde(default)]
    pub is_premium: Option<bool>,
}

impl PersistedSettings {
    /// Overwrite the flags this record carries
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(v) = self.protection_enabled {
            settings.protection_enabled = v;
        }
        if let Some(v) = self.push_notifications {
            settings.push_notifications = v;
        }
        if let Some(v) = self.email_alerts {
            settings.email_alerts = v;
        }
        if let Some(v) = self.is_premium {
            settings.is_premium = v;
        }
    }
}

impl From<&Settings> for PersistedSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            protection_enabled: Some(settings.protection_enabled),
            push_notifications: Some(settings.push_notifications),
            email_alerts: Some(settings.email_alerts),
            is_premium: Some(settings.is_premium),
        }
    }
}
