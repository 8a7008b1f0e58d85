use crate::error::Result;
use crate::layer::KinesisLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Options for installing the global subscriber.
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top of [`KinesisLayer`] so events are also printed to the
///   console.
#[derive(Clone, Debug)]
pub struct InitConfig {
    pub enable_stdout: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self { enable_stdout: true }
    }
}

/// Install `layer` as part of the global `tracing` subscriber.
///
/// **Parameters**
/// - `layer`: a [`KinesisLayer`] wrapping a fully configured hook.
/// - `config`: [`InitConfig`] controlling the extra console output.
///
/// **Returns**
/// - `Err(Error::SetGlobalDefault)` if a global subscriber was already set.
pub fn init_tracing_with_config(layer: KinesisLayer, config: InitConfig) -> Result<()> {
    // The two subscriber shapes have different types, so each branch
    // installs its own.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Install `layer` with [`InitConfig::default`].
pub fn init_tracing(layer: KinesisLayer) -> Result<()> {
    init_tracing_with_config(layer, InitConfig::default())
}
