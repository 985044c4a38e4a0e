/// Settings loading: defaults, TOML file, `STOCKWATCH_*` environment.
pub mod config;
/// Logging initialisation (filters, formats, rolling file sink).
pub mod logging;
/// Observable registry, subscribers, alert sinks.
pub mod observer;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// config
pub use config::Settings;
/// Logging entry point and its configuration.
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingHandle};
/// Registry API.
pub use observer::{
    AlertSink, DeliveryFailure, DeliveryPolicy, DeviceAlert, EmailAlert, FanoutSink,
    FnSubscriber, MemorySink, NotifyReport, ObservableRegistry, RemovePolicy, StdoutSink,
    Subscriber, SubscriberRef, TracingSink,
};
/// Operation errors and result types.
pub use stockwatch_error::{ObserverError, ObserverResult, StackError, StatusCode};
