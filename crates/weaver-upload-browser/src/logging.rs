//! Console logging for wasm entry points.

use tracing::Level;
use tracing::subscriber::set_global_default;
use tracing_subscriber::Registry;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

/// Upload events at debug, everything else at info.
pub const DEFAULT_LOG_FILTER: &str = "info,weaver::upload=debug";

/// Install the panic hook and a console tracing subscriber.
///
/// Safe to call more than once; only the first subscriber is installed.
pub fn init_logging(filter: &str) {
    console_error_panic_hook::set_once();

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let reg = Registry::default().with(filter).with(wasm_layer);

    let _ = set_global_default(reg);
}
