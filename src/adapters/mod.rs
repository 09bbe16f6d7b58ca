//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                 | Connects to                   |
//! |-------------|----------------------------|-------------------------------|
//! | `hardware`  | ActuatorPort               | embedded-hal relays, fan PWM  |
//! |             |                            | flow switch input             |
//! | `log_sink`  | EventSink                  | `log` console output          |
//! | `storage`   | SettingsPort, StoragePort  | key-value store / in-memory   |
//! | `time`      |                            | monotonic ms / µs clock       |
//! | `sim`       | SensorPort, ActuatorPort   | host simulation plant         |

pub mod hardware;
pub mod log_sink;
#[cfg(feature = "sim")]
pub mod sim;
pub mod storage;
pub mod time;
