use clap::Parser;
use shipquote::config::cli::{CliConfig, Command};
use shipquote::core::engine::quote_and_ship;
use shipquote::utils::clock::SystemClock;
use shipquote::utils::error::ErrorSeverity;
use shipquote::utils::logger;
use shipquote::utils::validation::validate_path;
use shipquote::{JsonFileShipmentStore, QuoteRequest, ShippingConfig, ShippingEngine, ShippingError};
use std::sync::Arc;

async fn run(cli: &CliConfig, config: &ShippingConfig) -> Result<(), ShippingError> {
    validate_path("data_dir", &cli.data_dir)?;
    let store = JsonFileShipmentStore::new(&cli.data_dir);
    let engine = ShippingEngine::from_config(config, store, Arc::new(SystemClock))?;

    match &cli.command {
        Command::Quote(args) => {
            let quote = engine.quote(&QuoteRequest::from(args)).await?;
            if quote.is_partial() {
                for failure in &quote.unavailable {
                    tracing::warn!(
                        "⚠️ {} unavailable (retryable: {}): {}",
                        failure.carrier,
                        failure.retryable,
                        failure.message
                    );
                }
            }
            // stdout 只輸出報價陣列，無法報價的承運商只記錄在日誌
            println!("{}", serde_json::to_string_pretty(&quote.offers)?);
        }
        Command::Ship {
            order_id,
            service,
            package,
            ..
        } => {
            let destination = cli.command.destination().unwrap_or_default();
            let receipt = quote_and_ship(
                &engine,
                order_id,
                &QuoteRequest::from(package),
                service.as_deref(),
                &config.origin,
                &destination,
            )
            .await?;
            tracing::info!("✅ Shipment booked: {}", receipt.tracking_number);
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Command::Track { tracking_number } => match engine.track(tracking_number).await? {
            Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
            None => {
                println!("Tracking number {} not found", tracking_number);
            }
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    // 載入配置：指定檔案或內建的 shipping.toml
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            ShippingConfig::from_file(path)
        }
        None => ShippingConfig::builtin(),
    };

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, &config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 1,      // 請求錯誤
            ErrorSeverity::Medium => 2,   // 可重試
            ErrorSeverity::High => 3,     // 配置或過期報價
            ErrorSeverity::Critical => 4, // 系統錯誤
        };
        std::process::exit(exit_code);
    }

    Ok(())
}
