//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements   | Connects to                        |
//! |---------------|--------------|------------------------------------|
//! | `gpio`        | DigitalInput | sysfs GPIO, embedded-hal pins, sim |
//! | `http`        | HttpClient   | reqwest blocking client            |
//! | `log_sink`    | EventSink    | process log output                 |
//! | `probe`       | PortProbe    | `TcpStream::connect_timeout`       |
//! | `time`        | Clock        | `Instant::now()`                   |
//! | `yaml_config` | ConfigPort   | YAML file on disk                  |

pub mod gpio;
pub mod http;
pub mod log_sink;
pub mod probe;
pub mod time;
pub mod yaml_config;
