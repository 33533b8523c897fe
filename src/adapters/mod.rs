//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to              |
//! |------------|--------------|--------------------------|
//! | `log_sink` | PublishPort  | Serial log output        |
//! | `link`     | LinkPort     | ESP-IDF WiFi STA state   |

pub mod link;
pub mod log_sink;
