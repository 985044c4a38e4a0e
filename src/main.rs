//! Демо stockwatch
//!
//! Воспроизводит сценарий «товар снова в наличии»: два email-подписчика и
//! один push-подписчик, поступление товара, отписка, повторное поступление.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use stockwatch::{
    init_logging, AlertSink, DeliveryPolicy, DeviceAlert, EmailAlert, FanoutSink, MemorySink,
    NotifyReport, ObservableRegistry, RemovePolicy, Settings, StdoutSink,
};
use tracing::debug;

/// Аргументы демо.
#[derive(Parser, Debug)]
#[command(name = "stockwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Back-in-stock observer demo", long_about = None)]
struct Cli {
    /// Путь к TOML-файлу настроек
    #[arg(short, long, env = "STOCKWATCH_CONFIG")]
    config: Option<PathBuf>,
    /// Имя товара (перекрывает настройки)
    #[arg(long)]
    item: Option<String>,
    /// Первое поступление товара
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    first: i64,
    /// Второе поступление товара (после отписки)
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    second: i64,
    /// Ошибка при удалении незарегистрированного подписчика
    #[arg(long)]
    strict_remove: bool,
    /// Прерывать рассылку на первом упавшем подписчике
    #[arg(long)]
    fail_fast: bool,
    /// Подробный вывод (debug)
    #[arg(short, long)]
    verbose: bool,
    /// Только предупреждения и ошибки
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Накладывает флаги командной строки поверх загруженных настроек.
    fn apply(
        &self,
        settings: &mut Settings,
    ) {
        if let Some(item) = &self.item {
            settings.item = item.clone();
        }
        if self.strict_remove {
            settings.remove_policy = RemovePolicy::Strict;
        }
        if self.fail_fast {
            settings.delivery_policy = DeliveryPolicy::FailFast;
        }
        if self.verbose {
            settings.logging = settings.logging.clone().with_level("debug");
        } else if self.quiet {
            settings.logging = settings.logging.clone().with_level("warn");
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    cli.apply(&mut settings);
    settings.validate().context("invalid settings")?;

    let _logging = init_logging(&settings.logging).context("failed to initialize logging")?;
    debug!(?settings, "settings loaded");

    run_demo(&cli, &settings)
}

fn run_demo(
    cli: &Cli,
    settings: &Settings,
) -> Result<()> {
    let delivered = Arc::new(MemorySink::new());
    let sinks: Vec<Arc<dyn AlertSink>> = vec![Arc::new(StdoutSink), delivered.clone()];
    let sink: Arc<dyn AlertSink> = Arc::new(FanoutSink::new(sinks));

    let mut registry = ObservableRegistry::from_settings(settings);

    let email1 = EmailAlert::new("user1@example.com", registry.source(), sink.clone())?
        .with_message(&settings.alert_message)
        .into_shared();
    let email2 = EmailAlert::new("user2@example.com", registry.source(), sink.clone())?
        .with_message(&settings.alert_message)
        .into_shared();
    let device1 = DeviceAlert::new("John", registry.source(), sink.clone())?
        .with_message(&settings.alert_message)
        .into_shared();

    registry.add(email1);
    registry.add(email2.clone());
    registry.add(device1);

    println!("Current {} stock: {}", registry.name(), registry.quantity());

    let first = registry
        .set_quantity(cli.first)
        .context("first restock broadcast failed")?;
    print_report(&first);
    println!("Updated {} stock: {}", registry.name(), registry.quantity());

    registry
        .remove(&email2)
        .context("failed to unsubscribe user2@example.com")?;
    println!(
        "Subscribers after removal: {}",
        registry.subscribers().collect::<Vec<_>>().join(", ")
    );

    let second = registry
        .set_quantity(cli.second)
        .context("second restock broadcast failed")?;
    print_report(&second);
    println!("Updated {} stock: {}", registry.name(), registry.quantity());

    println!(
        "Delivered {} alerts ({} mail, {} push)",
        delivered.len(),
        delivered.count_prefixed("Mail sent to:"),
        delivered.count_prefixed("Push sent to:")
    );
    Ok(())
}

fn print_report(report: &NotifyReport) {
    if report.is_silent() {
        println!("No alerts sent (quantity {})", report.quantity);
        return;
    }
    for failure in &report.failures {
        eprintln!(
            "Alert to {} (position {}) failed: {}",
            failure.subscriber, failure.position, failure.reason
        );
    }
}
