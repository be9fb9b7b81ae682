//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements   | Connects to                     |
//! |---------------|--------------|---------------------------------|
//! | `hardware`    | OutputPort   | ESP32 GPIO, LEDC PWM            |
//! | `mqtt`        | StatusPort   | ESP-IDF MQTT client             |
//! | `config_file` | ConfigPort   | JSON document on SPIFFS         |
//! | `time`        | –            | ESP32 system timer, SNTP clock  |
//! | `wifi`        | –            | ESP-IDF WiFi STA                |
//! | `lockfile`    | –            | SPIFFS                          |

pub mod config_file;
pub mod hardware;
pub mod lockfile;
pub mod mqtt;
pub mod time;
pub mod wifi;
