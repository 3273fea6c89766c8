//! ESP-IDF 上の周辺機能（実機ビルドのみ）

pub mod clock;
pub mod console;
pub mod http;
pub mod microphone;
pub mod wifi;

pub use clock::SystemClock;
pub use console::Console;
pub use http::HttpTransport;
pub use microphone::AdcMicrophone;
pub use wifi::WifiLink;
