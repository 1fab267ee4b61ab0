//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements   | Connects to                        |
//! |---------------|--------------|------------------------------------|
//! | `audio`       | AudioPort    | Log output (media client stand-in) |
//! | `config_json` | ConfigPort   | JSON file via serde_json           |
//! | `hal`         | SensorPort   | embedded-hal input pins            |
//! |               | ActuatorPort | embedded-hal output pins, PWM      |
//! | `log_sink`    | EventSink    | `log` facade                       |
//! | `sim`         | SensorPort   | In-memory simulated bathroom       |
//! |               | ActuatorPort |                                    |

pub mod audio;
pub mod config_json;
pub mod hal;
pub mod log_sink;
pub mod sim;
