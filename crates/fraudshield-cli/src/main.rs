use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fraudshield_core::{
    views::{filter_alerts, filter_transactions, unread_header, AlertFilter, RiskFilter},
    App, Config, Plan,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;

#[derive(Parser, Debug)]
#[command(name = "fraudshield")]
#[command(version, about = "Fraud alerts and account protection from the terminal", long_about = None)]
struct Cli {
    /// Directory holding the state database
    #[arg(long, global = true, env = "FRAUDSHIELD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fail instead of warning when the settings can't be read or written
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Protection status, risk counts and recent activity
    Dashboard,
    /// List transactions
    Transactions {
        /// all, high, medium or low
        #[arg(long, default_value = "all")]
        risk: String,
        /// Merchant name contains (case-insensitive)
        #[arg(long, default_value = "")]
        search: String,
    },
    /// List alerts
    Alerts {
        /// Only show unread alerts
        #[arg(long)]
        unread: bool,
    },
    /// Mark an alert as read
    Read {
        /// Alert id
        id: String,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
    /// Show the premium plans
    Paywall,
    /// Buy a premium plan
    Subscribe {
        /// monthly or yearly
        #[arg(default_value = "yearly")]
        plan: String,
    },
    /// Restore an earlier purchase
    Restore,
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
enum SettingsAction {
    Show,
    /// Turn fraud protection on or off
    ToggleProtection,
    /// Push notifications
    Push { state: Switch },
    /// Email alerts
    Email { state: Switch },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Switch {
    On,
    Off,
}

impl Switch {
    fn enabled(self) -> bool {
        self == Switch::On
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fraudshield=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("No command specified. Try --help");
        return Ok(());
    };

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(dir) = &cli.data_dir {
        config.storage.path = Some(dir.join("state.db"));
    }

    let app = start(&config, cli.strict).await?;
    run(&app, command, cli.strict).await
}

/// Build the app and load saved settings exactly once
async fn start(config: &Config, strict: bool) -> anyhow::Result<App> {
    if !strict {
        return Ok(App::from_config(config).await?);
    }

    // Strict: an unreadable record is an error, not a silent reset
    let app = App::open(config)?;
    app.store
        .try_load_from_storage()
        .await
        .context("Failed to read saved settings")?;
    Ok(app)
}

async fn run(app: &App, command: Commands, strict: bool) -> anyhow::Result<()> {
    let store = &app.store;

    match command {
        Commands::Dashboard => {
            output::dashboard(&store.snapshot().state);
        }
        Commands::Transactions { risk, search } => {
            tracing::info!("Listing transactions (risk: {}, search: {:?})", risk, search);
            let filter: RiskFilter = risk.parse()?;
            let txs = store.transactions();
            let shown = filter_transactions(&txs, filter, &search);
            output::transactions(&shown, filter, &search);
        }
        Commands::Alerts { unread } => {
            let filter = if unread {
                AlertFilter::Unread
            } else {
                AlertFilter::All
            };
            let alerts = store.alerts();
            output::alerts(&alerts, &filter_alerts(&alerts, filter), filter);
        }
        Commands::Read { id } => {
            tracing::info!("Marking alert {} read", id);
            if store.mark_alert_read(&id) {
                println!("Marked alert {} as read", id);
            } else {
                println!("No unread alert with id {}", id);
            }
            println!("{}", unread_header(store.unread_alert_count()));
        }
        Commands::Settings { action } => {
            let action = action.unwrap_or(SettingsAction::Show);
            tracing::info!("Settings: {:?}", action);
            let changed = match action {
                SettingsAction::Show => false,
                SettingsAction::ToggleProtection => {
                    store.toggle_protection();
                    true
                }
                SettingsAction::Push { state } => {
                    store.set_push_notifications(state.enabled());
                    true
                }
                SettingsAction::Email { state } => {
                    store.set_email_alerts(state.enabled());
                    true
                }
            };
            if changed {
                save(app, strict).await?;
            }
            output::settings(&store.settings());
        }
        Commands::Paywall => {
            let offerings = app.premium.offerings().await?;
            output::paywall(&offerings, store.is_premium());
        }
        Commands::Subscribe { plan } => {
            let plan: Plan = plan.parse()?;
            tracing::info!("Subscribing to {} plan", plan);
            if app.premium.subscribe(plan).await {
                println!("Welcome to Premium ({} plan)", plan);
            } else {
                println!("Purchase did not complete, you are still on the free plan");
            }
        }
        Commands::Restore => {
            tracing::info!("Restoring purchases");
            if app.premium.restore().await {
                println!("Premium restored");
            } else {
                println!("No active subscription found");
            }
        }
    }

    Ok(())
}

async fn save(app: &App, strict: bool) -> anyhow::Result<()> {
    // Transactions and alerts live only in this process; only settings are written
    if strict {
        app.store
            .try_save_to_storage()
            .await
            .context("Failed to save settings")?;
    } else {
        app.store.save_to_storage().await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudshield_core::config::StorageBackend;
    use fraudshield_storage::{KeyValueStore, SqliteStore};
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_transactions_filters() {
        let cli = Cli::try_parse_from([
            "fraudshield",
            "transactions",
            "--risk",
            "high",
            "--search",
            "amaz",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Transactions { risk, search }) => {
                assert_eq!(risk, "high");
                assert_eq!(search, "amaz");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_settings_switch_and_global_flags() {
        let cli = Cli::try_parse_from([
            "fraudshield",
            "settings",
            "push",
            "off",
            "--data-dir",
            "/tmp/fs",
            "--strict",
        ])
        .unwrap();

        assert!(cli.strict);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/fs")));
        match cli.command {
            Some(Commands::Settings { action }) => {
                assert_eq!(action, Some(SettingsAction::Push { state: Switch::Off }))
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_subscribe_defaults_to_yearly() {
        let cli = Cli::try_parse_from(["fraudshield", "subscribe"]).unwrap();
        match cli.command {
            Some(Commands::Subscribe { plan }) => assert_eq!(plan, "yearly"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_switch_is_rejected() {
        assert!(Cli::try_parse_from(["fraudshield", "settings", "email", "maybe"]).is_err());
    }

    async fn memory_app() -> App {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        App::from_config(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_strict_start_rejects_corrupt_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.db");
        let mut config = Config::default();
        config.storage.path = Some(path.clone());

        SqliteStore::open(&path)
            .unwrap()
            .set_item(&config.storage.key, "{not json")
            .await
            .unwrap();

        assert!(start(&config, true).await.is_err());
        assert!(start(&config, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_strict_start_loads_saved_settings() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.path = Some(dir.path().join("state.db"));

        let app = start(&config, false).await.unwrap();
        app.store.set_push_notifications(false);
        save(&app, true).await.unwrap();

        let app = start(&config, true).await.unwrap();
        assert!(!app.store.settings().push_notifications);
        assert_eq!(app.store.version(), 1);
    }

    #[tokio::test]
    async fn test_settings_commands_update_the_store() {
        let app = memory_app().await;

        let toggle = Commands::Settings {
            action: Some(SettingsAction::ToggleProtection),
        };
        run(&app, toggle, true).await.unwrap();
        assert!(!app.store.settings().protection_enabled);

        let email = Commands::Settings {
            action: Some(SettingsAction::Email { state: Switch::Off }),
        };
        run(&app, email, true).await.unwrap();
        assert!(!app.store.settings().email_alerts);
    }

    #[tokio::test]
    async fn test_read_marks_alert() {
        let app = memory_app().await;
        let before = app.store.unread_alert_count();

        run(&app, Commands::Read { id: "1".into() }, false)
            .await
            .unwrap();
        assert_eq!(app.store.unread_alert_count(), before - 1);
    }

    #[tokio::test]
    async fn test_unknown_risk_is_an_error() {
        let app = memory_app().await;
        let cmd = Commands::Transactions {
            risk: "extreme".into(),
            search: String::new(),
        };
        assert!(run(&app, cmd, false).await.is_err());
    }

    #[tokio::test]
    async fn test_stub_subscribe_keeps_free_plan() {
        let app = memory_app().await;
        run(&app, Commands::Subscribe { plan: "monthly".into() }, false)
            .await
            .unwrap();
        assert!(!app.store.is_premium());
    }
}
