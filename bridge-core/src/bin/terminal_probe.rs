// bridge-core/src/bin/terminal_probe.rs
// Connects once, prints what the terminal reports, disconnects.

use anyhow::{Context, Result};
use bridge_common::InitializeOptions;
use bridge_core::{AsyncBridgeControl, AsyncTerminal, AsyncTerminalApi, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load().context("loading bridge settings")?;
    println!("🛰️ Terminal probe: {}", settings.endpoint);
    let terminal = AsyncTerminal::new(settings);

    if !terminal.connect().await? {
        let err = terminal.last_error().await;
        println!("❌ Terminal unreachable: {}", err);
        return Ok(());
    }

    let login = match std::env::var("MT5_LOGIN") {
        Ok(raw) => Some(raw.parse::<u64>().context("MT5_LOGIN must be a number")?),
        Err(_) => None,
    };
    let password = std::env::var("MT5_PASSWORD").ok();
    let server = std::env::var("MT5_SERVER").ok();

    let initialized = terminal
        .initialize(
            None,
            login,
            password.as_deref(),
            server.as_deref(),
            None,
            InitializeOptions::default(),
        )
        .await?;
    if !initialized {
        println!("❌ Initialize failed: {}", terminal.last_error().await);
        terminal.disconnect().await;
        return Ok(());
    }

    println!(
        "💓 Health: {}",
        if terminal.health_check().await { "OK" } else { "NO RESPONSE" }
    );
    let breaker = terminal.breaker_status().await;
    println!(
        "🧯 Breaker: {:?} ({}/{} failures)",
        breaker.state, breaker.consecutive_failures, breaker.failure_threshold
    );

    match terminal.version().await? {
        Some(v) => println!("🧾 Version: {}.{} build {}", v.major, v.minor, v.build),
        None => println!("❌ Version unavailable: {}", terminal.last_error().await),
    }

    match terminal.terminal_info().await? {
        Some(info) => println!(
            "🖥️ Terminal: {} ({}), trading {}",
            info.name,
            info.company,
            if info.can_trade() { "allowed" } else { "disabled" }
        ),
        None => println!("❌ Terminal info unavailable: {}", terminal.last_error().await),
    }

    match terminal.account_info().await? {
        Some(account) => {
            println!("✅ Account {} on {}", account.login, account.server);
            println!(
                "💰 Balance {:.2} {} | Equity {:.2} | Margin use {:.1}%",
                account.balance,
                account.currency,
                account.equity,
                account.margin_usage_percent()
            );
        }
        None => println!("❌ Account info unavailable: {}", terminal.last_error().await),
    }

    println!("📈 Symbols available: {}", terminal.symbols_total().await?);

    terminal.disconnect().await;
    println!("🔌 Disconnected");
    Ok(())
}
