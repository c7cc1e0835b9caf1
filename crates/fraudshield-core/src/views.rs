// View logic the screens share: filters, search, counts, badge text
//
// Everything here is a pure function over slices. Lists are small, so each
// helper is a single linear pass that keeps the input order.
use std::str::FromStr;

use crate::{
    models::{Alert, AlertSeverity, RiskLevel, Transaction},
    Error,
};

/// How many transactions the dashboard lists
pub const DASHBOARD_RECENT_LIMIT: usize = 4;

/// Risk tab on the transactions screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RiskFilter {
    #[default]
    All,
    Only(RiskLevel),
}

impl RiskFilter {
    pub fn matches(&self, risk: RiskLevel) -> bool {
        match self {
            RiskFilter::All => true,
            RiskFilter::Only(level) => *level == risk,
        }
    }

    /// Tab label ("All", "High", ...)
    pub fn label(&self) -> &'static str {
        match self {
            RiskFilter::All => "All",
            RiskFilter::Only(RiskLevel::High) => "High",
            RiskFilter::Only(RiskLevel::Medium) => "Medium",
            RiskFilter::Only(RiskLevel::Low) => "Low",
        }
    }

    /// Tabs in the order the screen shows them
    pub fn tabs() -> [RiskFilter; 4] {
        [
            RiskFilter::All,
            RiskFilter::Only(RiskLevel::High),
            RiskFilter::Only(RiskLevel::Medium),
            RiskFilter::Only(RiskLevel::Low),
        ]
    }
}

impl FromStr for RiskFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(RiskFilter::All);
        }
        s.parse().map(RiskFilter::Only)
    }
}

/// Case-insensitive merchant search combined with the risk tab
///
/// An empty query matches everything.
pub fn filter_transactions<'a>(
    transactions: &'a [Transaction],
    filter: RiskFilter,
    query: &str,
) -> Vec<&'a Transaction> {
    let needle = query.to_lowercase();
    transactions
        .iter()
        .filter(|tx| filter.matches(tx.risk))
        .filter(|tx| needle.is_empty() || tx.merchant.to_lowercase().contains(&needle))
        .collect()
}

/// Tab on the alerts screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlertFilter {
    #[default]
    All,
    Unread,
}

impl FromStr for AlertFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(AlertFilter::All),
            "unread" => Ok(AlertFilter::Unread),
            other => Err(Error::InvalidValue(format!("unknown alert filter '{}'", other))),
        }
    }
}

pub fn filter_alerts(alerts: &[Alert], filter: AlertFilter) -> Vec<&Alert> {
    alerts
        .iter()
        .filter(|a| filter == AlertFilter::All || !a.read)
        .collect()
}

pub fn count_unread(alerts: &[Alert]) -> usize {
    alerts.iter().filter(|a| !a.read).count()
}

/// Tab label with its count, e.g. "Unread (2)"
pub fn alert_filter_label(filter: AlertFilter, alerts: &[Alert]) -> String {
    match filter {
        AlertFilter::All => format!("All ({})", alerts.len()),
        AlertFilter::Unread => format!("Unread ({})", count_unread(alerts)),
    }
}

/// Alerts screen subtitle
pub fn unread_header(unread: usize) -> String {
    if unread > 0 {
        format!("{} unread", unread)
    } else {
        "All caught up".to_string()
    }
}

/// Per-risk counts for the dashboard cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskSummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskSummary {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions
            .iter()
            .fold(Self::default(), |mut summary, tx| {
                match tx.risk {
                    RiskLevel::High => summary.high += 1,
                    RiskLevel::Medium => summary.medium += 1,
                    RiskLevel::Low => summary.low += 1,
                }
                summary
            })
    }

    pub fn count(&self, risk: RiskLevel) -> usize {
        match risk {
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Newest `limit` transactions (the store keeps them newest-first)
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> &[Transaction] {
    &transactions[..limit.min(transactions.len())]
}

/// Semantic colour a badge is drawn in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Error,
    Warning,
    Success,
    Info,
}

impl Tone {
    pub fn for_risk(risk: RiskLevel) -> Self {
        match risk {
            RiskLevel::High => Tone::Error,
            RiskLevel::Medium => Tone::Warning,
            RiskLevel::Low => Tone::Success,
        }
    }
}

/// Alert severity as the alerts screen draws it
///
/// The screen also shows purely informational notices, which the store
/// never holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplaySeverity {
    High,
    Medium,
    Low,
    Info,
}

impl DisplaySeverity {
    pub fn label(&self) -> &'static str {
        match self {
            DisplaySeverity::High => "HIGH",
            DisplaySeverity::Medium => "MEDIUM",
            DisplaySeverity::Low => "LOW",
            DisplaySeverity::Info => "INFO",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            DisplaySeverity::High => Tone::Error,
            DisplaySeverity::Medium => Tone::Warning,
            DisplaySeverity::Low => Tone::Success,
            DisplaySeverity::Info => Tone::Info,
        }
    }
}

impl From<AlertSeverity> for DisplaySeverity {
    fn from(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::High => DisplaySeverity::High,
            AlertSeverity::Medium => DisplaySeverity::Medium,
            AlertSeverity::Low => DisplaySeverity::Low,
        }
    }
}

/// Badge on a transaction row: pending wins over the risk label
pub fn transaction_badge(tx: &Transaction) -> &'static str {
    if tx.pending {
        "PENDING"
    } else {
        tx.risk.label()
    }
}

pub fn risk_icon(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::High => "⚠️",
        RiskLevel::Medium => "⏳",
        RiskLevel::Low => "✅",
    }
}

pub fn protection_status(enabled: bool) -> &'static str {
    if enabled {
        "Protection Active"
    } else {
        "Protection Off"
    }
}
