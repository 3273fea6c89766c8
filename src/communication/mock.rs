use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::uploader::{ReadingTransport, TransportError};

/// 記録されたリクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Vec<u8>,
    pub timeout_ms: u64,
}

/// テスト用の送信モック
///
/// 実際の通信を行わずにリクエストを記録します。
/// 応答はキューに積んだ順に返し、空の場合は200を返します。
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    pub responses: Arc<Mutex<VecDeque<Result<u16, TransportError>>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用: 次の応答ステータスを追加
    pub fn queue_status(&self, status: u16) {
        self.responses.lock().unwrap().push_back(Ok(status));
    }

    /// テスト用: 次の応答をエラーにする
    pub fn queue_error(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// テスト用: 記録されたリクエストを取得
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// テスト用: 直前のリクエストボディをJSONとして取得
    pub fn last_json(&self) -> Option<serde_json::Value> {
        let requests = self.requests.lock().unwrap();
        let last = requests.last()?;
        serde_json::from_slice(&last.body).ok()
    }
}

impl ReadingTransport for MockTransport {
    fn post(&mut self, url: &str, body: &[u8], timeout_ms: u64) -> Result<u16, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            body: body.to_vec(),
            timeout_ms,
        });
        self.responses.lock().unwrap().pop_front().unwrap_or(Ok(200))
    }
}
