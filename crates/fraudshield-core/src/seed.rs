// Demo content the store starts with until a real feed exists
use crate::models::{Alert, AlertSeverity, RiskLevel, Transaction};

/// Newest first, same as the store keeps them
pub fn demo_transactions() -> Vec<Transaction> {
    vec![
        Transaction::new("1", "Amazon", "$47.99", "Feb 14", RiskLevel::Low)
            .with_time("10:32 AM")
            .with_category("Shopping"),
        Transaction::new("2", "Netflix", "$15.99", "Feb 13", RiskLevel::Low)
            .with_time("2:15 PM")
            .with_category("Entertainment"),
        Transaction::new("3", "Unknown", "$299.00", "Feb 12", RiskLevel::High)
            .with_time("11:48 PM")
            .with_category("Transfer"),
    ]
}

pub fn demo_alerts() -> Vec<Alert> {
    vec![
        Alert::new("1", AlertSeverity::High, "Unusual Transfer", "$299 blocked"),
        Alert::new("2", AlertSeverity::Medium, "Pending Review", "$250 pending"),
    ]
}
