use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling::daily};
use tracing_subscriber::{fmt, registry::LookupSpan, Layer};

use crate::logging::config::FileConfig;

/// Файловый слой с ежедневной ротацией и неблокирующей записью.
///
/// `WorkerGuard` нужно держать до конца работы, иначе хвост логов
/// потеряется.
pub fn layer_with_config<S>(config: &FileConfig) -> (Box<dyn Layer<S> + Send + Sync>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let file_appender = daily(&config.dir, &config.prefix);
    let (non_blocking_writer, guard) = non_blocking(file_appender);

    let layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_writer);

    (Box::new(layer), guard)
}
