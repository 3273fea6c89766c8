use log::{debug, info, warn};

use super::payload::ReadingPayload;

/// 送信エラー
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("接続エラー: {0}")]
    Connect(String),
    #[error("応答がタイムアウトしました")]
    Timeout,
    #[error("サーバーがエラーを返しました: HTTP {0}")]
    Status(u16),
    #[error("JSONの生成に失敗: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// ペイロードを1件送信する手段（実機ではHTTP POST）
///
/// 呼び出しは応答を受け取るか `timeout_ms` が過ぎるまでブロックし、
/// HTTPステータスコードを返します。
pub trait ReadingTransport {
    fn post(&mut self, url: &str, body: &[u8], timeout_ms: u64) -> Result<u16, TransportError>;
}

/// アップロード結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 送信し、2xxを受け取った
    Sent { status: u16 },
    /// 前回の送信から間隔が経っていないため送信しなかった
    Skipped,
}

/// 送信間隔を管理しながらペイロードを送る
pub struct Uploader<T> {
    transport: T,
    url: String,
    interval_ms: u64,
    timeout_ms: u64,
    last_attempt_ms: Option<u64>,
    sent: u32,
    failed: u32,
}

impl<T: ReadingTransport> Uploader<T> {
    pub fn new(transport: T, url: impl Into<String>, interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            transport,
            url: url.into(),
            interval_ms,
            timeout_ms,
            last_attempt_ms: None,
            sent: 0,
            failed: 0,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 送信先を変更（送信間隔の計測は維持）
    pub fn reconfigure(&mut self, url: impl Into<String>) {
        self.url = url.into();
        info!("送信先を変更しました: {}", self.url);
    }

    /// 送信が許可される時刻か
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.last_attempt_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.interval_ms)
    }

    /// (成功数, 失敗数)
    pub fn stats(&self) -> (u32, u32) {
        (self.sent, self.failed)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 間隔が経っていれば送信する
    ///
    /// 失敗しても次の送信は通常どおり間隔をあけて行います（再送はしない）。
    pub fn upload(&mut self, payload: &ReadingPayload, now_ms: u64) -> Result<UploadOutcome, TransportError> {
        if !self.is_due(now_ms) {
            return Ok(UploadOutcome::Skipped);
        }
        // 失敗時も間隔をあけるため送信前に更新
        self.last_attempt_ms = Some(now_ms);

        let result = self.send(payload);
        match &result {
            Ok(status) => {
                self.sent += 1;
                debug!("送信成功: HTTP {} ({} 件目)", status, self.sent);
            }
            Err(e) => {
                self.failed += 1;
                warn!("送信失敗: {} (失敗 {} 件)", e, self.failed);
            }
        }
        result.map(|status| UploadOutcome::Sent { status })
    }

    fn send(&mut self, payload: &ReadingPayload) -> Result<u16, TransportError> {
        let body = payload.to_json()?;
        let status = self.transport.post(&self.url, &body, self.timeout_ms)?;
        if (200..300).contains(&status) {
            Ok(status)
        } else {
            Err(TransportError::Status(status))
        }
    }
}
