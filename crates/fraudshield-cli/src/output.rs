// Plain-text rendering of the screens
use fraudshield_core::{
    views::{
        alert_filter_label, protection_status, recent_transactions, risk_icon,
        transaction_badge, unread_header, AlertFilter, DisplaySeverity, RiskFilter, RiskSummary,
        DASHBOARD_RECENT_LIMIT,
    },
    Alert, AppState, Plan, RiskLevel, Settings, Transaction,
};
use fraudshield_purchases::{find_product, Offering, PRODUCT_MONTHLY, PRODUCT_YEARLY};

pub fn dashboard(state: &AppState) {
    let settings = &state.settings;

    println!("{}", protection_status(settings.protection_enabled));
    println!("Protection score: {}/100", state.protection_score);
    if settings.is_premium {
        println!("Plan: Premium");
    }
    println!();

    let summary = RiskSummary::from_transactions(&state.transactions);
    for risk in [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low] {
        println!("  {} {:<6} {}", risk_icon(risk), risk.label(), summary.count(risk));
    }
    println!("Alerts: {}", unread_header(state.unread_alert_count()));
    println!();

    println!("Recent activity");
    for tx in recent_transactions(&state.transactions, DASHBOARD_RECENT_LIMIT) {
        transaction_row(tx);
    }
}

pub fn transactions(shown: &[&Transaction], filter: RiskFilter, search: &str) {
    let tabs: Vec<String> = RiskFilter::tabs()
        .iter()
        .map(|tab| {
            if *tab == filter {
                format!("[{}]", tab.label())
            } else {
                tab.label().to_string()
            }
        })
        .collect();
    println!("{}", tabs.join("  "));

    if shown.is_empty() {
        if search.is_empty() {
            println!("No transactions");
        } else {
            println!("No transactions matching '{}'", search);
        }
        return;
    }

    for tx in shown {
        transaction_row(tx);
    }
}

fn transaction_row(tx: &Transaction) {
    let when = match &tx.time {
        Some(time) => format!("{} {}", tx.date, time),
        None => tx.date.clone(),
    };
    println!(
        "  {:>4}  {:<20} {:>10}  {:<16} {}",
        tx.id,
        tx.merchant,
        tx.amount,
        when,
        transaction_badge(tx)
    );
}

pub fn alerts(all: &[Alert], shown: &[&Alert], filter: AlertFilter) {
    let header: Vec<String> = [AlertFilter::All, AlertFilter::Unread]
        .iter()
        .map(|tab| {
            let label = alert_filter_label(*tab, all);
            if *tab == filter {
                format!("[{}]", label)
            } else {
                label
            }
        })
        .collect();
    println!("{}", header.join("  "));

    if shown.is_empty() {
        println!("{}", unread_header(0));
        return;
    }

    for alert in shown {
        let marker = if alert.read { " " } else { "*" };
        println!(
            "{} {:>4}  {:<7} {}",
            marker,
            alert.id,
            DisplaySeverity::from(alert.severity).label(),
            alert.title
        );
        println!("        {}", alert.description);
    }
}

pub fn settings(settings: &Settings) {
    let on_off = |v: bool| if v { "on" } else { "off" };

    println!("Fraud protection     {}", on_off(settings.protection_enabled));
    println!("Push notifications   {}", on_off(settings.push_notifications));
    println!("Email alerts         {}", on_off(settings.email_alerts));
    println!(
        "Plan                 {}",
        if settings.is_premium { "Premium" } else { "Free" }
    );
}

pub fn paywall(offerings: &[Offering], is_premium: bool) {
    if is_premium {
        println!("You already have Premium");
        return;
    }

    println!("FraudShield Premium");
    let monthly = find_product(offerings, PRODUCT_MONTHLY);
    let yearly = find_product(offerings, PRODUCT_YEARLY);

    if let Some(product) = monthly {
        println!("  monthly  {} / {}", product.price, product.period);
        plan_features(Plan::Monthly);
    }
    if let Some(product) = yearly {
        let savings = monthly
            .map(|m| product.savings_percent_over(m))
            .filter(|pct| *pct > 0)
            .map(|pct| format!("  (save {}%)", pct))
            .unwrap_or_default();
        println!("  yearly   {} / {}{}", product.price, product.period, savings);
        plan_features(Plan::Yearly);
    }
    if monthly.is_none() && yearly.is_none() {
        println!("  No plans available right now");
        return;
    }

    println!();
    println!("Run `fraudshield subscribe <monthly|yearly>` to upgrade");
}

fn plan_features(plan: Plan) {
    for feature in plan.features() {
        println!("           - {}", feature);
    }
}
