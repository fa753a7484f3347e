//! CLI command definitions and handlers.
//!
//! Clap derive structs for the curve-sniper binary, plus the dispatch
//! logic that wires the paper trading stack into the bot controller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::paper::{
    DriftingPriceSource, PaperAnalyzer, PaperBuyer, PaperMarket, PaperRpc, PaperSafetyChecker,
    PaperSeller, PaperWallet, SyntheticMonitor,
};
use crate::application::{BotController, BotDeps};
use crate::config::{load_config, Config, DEFAULT_CONFIG_PATH};
use crate::domain::SystemClock;

/// Starting bankroll for the paper wallet, in SOL.
const PAPER_WALLET_SOL: f64 = 10.0;

/// How often the synthetic monitor emits a launch in paper mode.
const PAPER_LAUNCH_INTERVAL: Duration = Duration::from_secs(2);

/// How often the run loop logs a status line while the bot is up.
const STATUS_INTERVAL: Duration = Duration::from_secs(60);

/// Curve Sniper - launch sniper for bonding curve tokens
#[derive(Parser, Debug)]
#[command(
    name = "curve-sniper",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Launch sniper for pump.fun-style bonding curve tokens",
    long_about = "Watches new bonding curve launches, scores each token for safety and \
                  opportunity, buys the ones that clear every filter, and manages the \
                  resulting positions with take-profit, stop-loss, and trailing stops."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the sniper until interrupted
    Run(RunCmd),

    /// Validate configuration and print the effective settings
    CheckConfig(CheckConfigCmd),
}

/// Run the sniper
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file (defaults to ./config.toml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Paper trading mode: synthetic launches and simulated fills
    #[arg(short, long)]
    pub paper: bool,

    /// Stop automatically after this many seconds
    #[arg(long, value_name = "SECS")]
    pub duration: Option<u64>,
}

/// Validate configuration
#[derive(Parser, Debug)]
pub struct CheckConfigCmd {
    /// Path to configuration file (defaults to ./config.toml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the parsed CLI command.
pub async fn execute(app: CliApp) -> Result<()> {
    match app.command {
        Command::Run(cmd) => {
            let (config, source) = resolve_config(cmd.config.as_deref())?;
            init_logging(app.verbose, app.debug, &config.logging.level)?;
            tracing::info!("{}", source);
            run_command(cmd, config).await
        }
        Command::CheckConfig(cmd) => {
            let (config, source) = resolve_config(cmd.config.as_deref())?;
            init_logging(app.verbose, app.debug, &config.logging.level)?;
            tracing::info!("{}", source);
            check_config_command(&cmd, &config)
        }
    }
}

fn init_logging(verbose: bool, debug: bool, config_level: &str) -> Result<()> {
    let level = if debug {
        "trace"
    } else if verbose {
        "debug"
    } else {
        config_level
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("curve_sniper={}", level)));

    fmt().with_env_filter(filter).with_target(false).init();
    Ok(())
}

/// Resolve the configuration for this invocation.
///
/// An explicit `--config` path must exist. Without one, `config.toml` in
/// the working directory is used when present, otherwise built-in defaults.
fn resolve_config(path: Option<&Path>) -> Result<(Config, String)> {
    match path {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            let config = load_config(&expanded)
                .with_context(|| format!("Failed to load configuration from {}", expanded))?;
            Ok((config, format!("Loaded configuration from {}", expanded)))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            let config = load_config(DEFAULT_CONFIG_PATH).with_context(|| {
                format!("Failed to load configuration from {}", DEFAULT_CONFIG_PATH)
            })?;
            Ok((
                config,
                format!("Loaded configuration from {}", DEFAULT_CONFIG_PATH),
            ))
        }
        None => Ok((
            Config::default(),
            "No config file found, using built-in defaults".to_string(),
        )),
    }
}

async fn run_command(cmd: RunCmd, mut config: Config) -> Result<()> {
    if cmd.paper {
        config.trading.simulation_mode = true;
    }

    if !config.trading.simulation_enabled() {
        anyhow::bail!(
            "live trading requires on-chain execution adapters, which this build does not \
             include; run with --paper or set simulation_mode = true"
        );
    }

    print_banner(&config);

    let market = Arc::new(PaperMarket::new());
    let wallet = Arc::new(PaperWallet::new(PAPER_WALLET_SOL));
    let slippage_bps = (config.trading.max_slippage_pct * 100.0) as u16;

    let deps = BotDeps {
        monitor: Arc::new(SyntheticMonitor::new(PAPER_LAUNCH_INTERVAL)),
        validator: Arc::new(PaperAnalyzer::new(market.clone()).with_market_cap_band(
            config.filters.min_market_cap,
            config.filters.max_market_cap,
        )),
        safety: Arc::new(PaperSafetyChecker::new()),
        buyer: Arc::new(PaperBuyer::new(
            market.clone(),
            wallet.clone(),
            config.trading.buy_amount_sol,
            slippage_bps,
        )),
        seller: Arc::new(PaperSeller::new(market.clone(), wallet.clone(), slippage_bps)),
        rpc: Arc::new(PaperRpc::new(wallet.clone())),
        price_source: Arc::new(DriftingPriceSource::new(market)),
        clock: Arc::new(SystemClock),
    };

    let controller = BotController::new(config, deps);
    controller.start().await.context("Failed to start bot")?;

    wait_for_shutdown(&controller, cmd.duration).await?;

    controller.stop().await;
    print_summary(&controller).await;

    tracing::info!("Curve sniper stopped");
    Ok(())
}

/// Block until Ctrl+C, SIGTERM, or the optional run duration elapses,
/// logging a status line every [`STATUS_INTERVAL`].
async fn wait_for_shutdown(controller: &BotController, duration_secs: Option<u64>) -> Result<()> {
    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("Failed to install SIGTERM handler")?;

    let run_deadline = async {
        match duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(run_deadline);

    loop {
        #[cfg(unix)]
        let sigterm_recv = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_recv = std::future::pending::<Option<()>>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            _ = sigterm_recv => {
                tracing::info!("SIGTERM received");
                break;
            }
            _ = &mut run_deadline => {
                tracing::info!("Run duration elapsed");
                break;
            }
            _ = tokio::time::sleep(STATUS_INTERVAL) => {
                log_status(controller).await;
            }
        }
    }

    Ok(())
}

async fn log_status(controller: &BotController) {
    let status = controller.status().await;
    tracing::info!(
        "Status: state={} open={} closed={} realized={:+.4} SOL unrealized={:+.4} SOL events={}",
        status.state,
        status.positions.open,
        status.positions.closed,
        status.positions.realized_pnl,
        status.positions.unrealized_pnl,
        status.monitor.events_emitted
    );
}

fn print_banner(config: &Config) {
    println!();
    println!("======================================");
    println!("    Curve Sniper v{}", env!("CARGO_PKG_VERSION"));
    println!("======================================");
    println!();
    println!("  Mode:            PAPER (simulated fills)");
    println!("  Buy amount:      {} SOL", config.trading.buy_amount_sol);
    println!("  Safety score:    >= {}", config.filters.min_safety_score);
    println!(
        "  Opportunity:     >= {}",
        config.filters.min_opportunity_score
    );
    println!(
        "  Market cap:      ${:.0} - ${:.0}",
        config.filters.min_market_cap, config.filters.max_market_cap
    );
    println!("  Liquidity:       >= {} SOL", config.filters.min_liquidity);
    println!("  Take profit:     +{}%", config.exits.take_profit_pct);
    println!("  Stop loss:       -{}%", config.exits.stop_loss_pct);
    println!(
        "  Trailing stop:   {}% from peak",
        config.exits.trailing_stop_pct
    );
    println!();
}

async fn print_summary(controller: &BotController) {
    let status = controller.status().await;
    let closed = controller.positions().closed_positions().await;

    println!();
    println!("======================================");
    println!("    Session Summary");
    println!("======================================");
    println!();
    println!(
        "  Buys:            {} filled, {} failed",
        status.buyer.fills, status.buyer.failures
    );
    println!(
        "  Sells:           {} filled, {} failed",
        status.seller.fills, status.seller.failures
    );
    println!("  Open positions:  {}", status.positions.open);
    println!("  Closed:          {}", status.positions.closed);
    println!(
        "  Realized PnL:    {:+.4} SOL",
        status.positions.realized_pnl
    );
    println!(
        "  Unrealized PnL:  {:+.4} SOL",
        status.positions.unrealized_pnl
    );

    if !closed.is_empty() {
        println!();
        println!("  Closed positions:");
        for position in closed {
            let trigger = position
                .closed_by
                .map(|t| t.to_string())
                .unwrap_or_else(|| "manual".to_string());
            println!(
                "    {} {:+.4} SOL ({:+.2}%) via {}",
                position.token_symbol, position.pnl, position.pnl_percentage, trigger
            );
        }
    }
    println!();
}

fn check_config_command(cmd: &CheckConfigCmd, config: &Config) -> Result<()> {
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("✓ Configuration valid");
    println!();
    println!("  Trading:");
    println!(
        "    Buy amount:       {} SOL",
        config.trading.buy_amount_sol
    );
    println!("    Max slippage:     {}%", config.trading.max_slippage_pct);
    println!(
        "    Simulation:       {}",
        config.trading.simulation_enabled()
    );
    println!("  Filters:");
    println!(
        "    Safety score:     >= {}",
        config.filters.min_safety_score
    );
    println!(
        "    Opportunity:      >= {}",
        config.filters.min_opportunity_score
    );
    println!(
        "    Market cap:       ${:.0} - ${:.0}",
        config.filters.min_market_cap, config.filters.max_market_cap
    );
    println!(
        "    Liquidity:        >= {} SOL",
        config.filters.min_liquidity
    );
    println!("  Exits:");
    println!("    Take profit:      +{}%", config.exits.take_profit_pct);
    println!("    Stop loss:        -{}%", config.exits.stop_loss_pct);
    println!(
        "    Trailing stop:    {}% from peak",
        config.exits.trailing_stop_pct
    );
    println!("  Limits:");
    println!("    Cooldown:         {} ms", config.limits.cooldown_ms);
    println!(
        "    Max trades/hour:  {}",
        config.limits.max_trades_per_hour
    );
    println!("  Schedule:");
    println!(
        "    Position check:   every {}s",
        config.schedule.position_check_secs
    );
    println!(
        "    Health check:     every {}s",
        config.schedule.health_check_secs
    );

    Ok(())
}
