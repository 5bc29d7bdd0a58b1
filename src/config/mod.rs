//! Tool configuration
//!
//! Three layers, later ones winning:
//! 1. Built-in defaults
//! 2. User config (`<config dir>/settings-dialog/config.toml`)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{default_config_path, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use merge::{deep_merge, merge_layers};
