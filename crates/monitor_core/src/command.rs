/// シリアルコンソールのコマンド解析

use log::{debug, warn};

/// 1行の最大長（超えた行は破棄）
pub const MAX_LINE_LENGTH: usize = 128;

/// 解析されたコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// プロキシ（アップロード先）の変更
    /// フォーマット: "SET PROXY host[:port]"
    SetProxy {
        host: String,
        /// 省略時は現在のポートを維持
        port: Option<u16>,
    },
    /// Wi-Fi 認証情報の変更
    /// フォーマット: "SET WIFI ssid password"
    SetWifi { ssid: String, password: String },
    /// 現在の設定を表示
    GetConfig,
    /// 不明なコマンド
    Unknown(String),
}

/// コマンド解析エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    /// 引数が不足している
    MissingArgument(&'static str),
    /// 無効なポート番号
    InvalidPort(String),
}

impl core::fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingArgument(name) => write!(f, "引数が不足しています: {}", name),
            Self::InvalidPort(port) => write!(f, "無効なポート番号: '{}'", port),
        }
    }
}

impl std::error::Error for CommandParseError {}

/// 大文字小文字を区別せずに接頭辞を取り除く
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &line[keyword.len()..];
    // キーワードの直後は空白か行末
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// コマンド文字列を解析します
pub fn parse_command(line: &str) -> Result<ConsoleCommand, CommandParseError> {
    let trimmed = line.trim();
    debug!("コマンド解析: '{}'", trimmed);

    if let Some(payload) = strip_keyword(trimmed, "SET PROXY") {
        parse_proxy(payload)
    } else if let Some(payload) = strip_keyword(trimmed, "SET WIFI") {
        parse_wifi(payload)
    } else if trimmed.eq_ignore_ascii_case("GET CONFIG") {
        Ok(ConsoleCommand::GetConfig)
    } else {
        warn!("不明なコマンド: '{}'", trimmed);
        Ok(ConsoleCommand::Unknown(trimmed.to_string()))
    }
}

fn parse_proxy(payload: &str) -> Result<ConsoleCommand, CommandParseError> {
    let (host, port) = match payload.split_once(':') {
        Some((host, port)) => (host.trim(), port.trim()),
        None => (payload, ""),
    };

    if host.is_empty() {
        return Err(CommandParseError::MissingArgument("host"));
    }

    let port = if port.is_empty() {
        None
    } else {
        match port.parse::<u16>() {
            Ok(p) if p > 0 => Some(p),
            _ => {
                warn!("無効なポート番号: '{}'", port);
                return Err(CommandParseError::InvalidPort(port.to_string()));
            }
        }
    };

    Ok(ConsoleCommand::SetProxy {
        host: host.to_string(),
        port,
    })
}

fn parse_wifi(payload: &str) -> Result<ConsoleCommand, CommandParseError> {
    // パスワードは空白を含みうるため、最初の空白でのみ分割
    let Some((ssid, password)) = payload.split_once(char::is_whitespace) else {
        return Err(CommandParseError::MissingArgument("password"));
    };
    let ssid = ssid.trim();
    if ssid.is_empty() {
        return Err(CommandParseError::MissingArgument("ssid"));
    }
    Ok(ConsoleCommand::SetWifi {
        ssid: ssid.to_string(),
        password: password.trim().to_string(),
    })
}

/// UARTの受信バイト列から行を組み立てる
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: Vec<u8>,
    overflowed: bool,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1バイト追加し、行が完成したら返す（空行は返さない）
    pub fn push(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\r' | b'\n' => {
                let overflowed = std::mem::take(&mut self.overflowed);
                let line = std::mem::take(&mut self.buffer);
                if overflowed {
                    warn!("コマンドが長すぎるため破棄しました");
                    return None;
                }
                let line = String::from_utf8_lossy(&line).trim().to_string();
                (!line.is_empty()).then_some(line)
            }
            _ if self.overflowed => None,
            _ => {
                if self.buffer.len() >= MAX_LINE_LENGTH {
                    self.buffer.clear();
                    self.overflowed = true;
                } else {
                    self.buffer.push(byte);
                }
                None
            }
        }
    }

    /// 複数バイトを追加し、完成した行をすべて返す
    pub fn extend(&mut self, bytes: &[u8]) -> Vec<String> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }
}
