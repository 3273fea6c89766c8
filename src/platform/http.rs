use std::time::Duration;

use embedded_svc::http::client::Client;
use embedded_svc::io::Write;
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};
use esp_idf_svc::io::EspIOError;
use esp_idf_svc::sys;
use log::debug;

use crate::communication::{ReadingTransport, TransportError};

/// HTTP POST による送信
///
/// 送信ごとに接続を作り直し、応答を受け取ったら閉じます。
#[derive(Debug, Default)]
pub struct HttpTransport;

impl From<EspIOError> for TransportError {
    fn from(error: EspIOError) -> Self {
        let code = error.0.code();
        if code == sys::ESP_ERR_TIMEOUT {
            TransportError::Timeout
        } else {
            TransportError::Connect(format!("ESP-IDF error: {}", error))
        }
    }
}

impl From<sys::EspError> for TransportError {
    fn from(error: sys::EspError) -> Self {
        EspIOError(error).into()
    }
}

impl ReadingTransport for HttpTransport {
    fn post(&mut self, url: &str, body: &[u8], timeout_ms: u64) -> Result<u16, TransportError> {
        let connection = EspHttpConnection::new(&HttpConfiguration {
            timeout: Some(Duration::from_millis(timeout_ms)),
            ..Default::default()
        })?;
        let mut client = Client::wrap(connection);

        let content_length = body.len().to_string();
        let headers = [
            ("content-type", "application/json"),
            ("content-length", content_length.as_str()),
        ];

        let mut request = client.post(url, &headers)?;
        request.write_all(body)?;
        request.flush()?;
        let response = request.submit()?;
        let status = response.status();
        debug!("POST {} -> HTTP {}", url, status);
        Ok(status)
    }
}
