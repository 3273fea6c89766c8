use env_sensors::{MotionConfig, OutputProfile};
use log::{info, warn};
use monitor_core::{parse_command, ConsoleCommand};

/// アプリケーション設定
///
/// この構造体はビルド時に`build.rs`によって`cfg.toml`ファイルから
/// 読み込まれた設定を保持します。
#[toml_cfg::toml_config]
pub struct Config {
    #[default("MXCHIP_001")]
    device_id: &'static str,

    #[default("")]
    wifi_ssid: &'static str,

    #[default("")]
    wifi_password: &'static str,

    #[default("192.168.1.100")]
    proxy_host: &'static str,

    #[default(3000)]
    proxy_port: u16,

    #[default("/sensor-data")]
    proxy_endpoint: &'static str,

    #[default(2000)]
    upload_interval_ms: u64,

    #[default(1000)]
    sample_interval_ms: u64,

    #[default(5000)]
    response_timeout_ms: u64,

    // 起動直後にコンソールコマンドを受け付ける時間
    #[default(10000)]
    console_window_ms: u64,

    // 出力が得られない場合の LSM6DS3 設定 (0x60 = 416Hz)
    #[default(0x60)]
    fallback_accel_ctrl: u8,

    #[default(0x60)]
    fallback_gyro_ctrl: u8,
}

/// 設定エラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("device_id が設定されていません")]
    EmptyDeviceId,
    #[error("proxy_host が設定されていません")]
    EmptyProxyHost,
    #[error("無効なポート番号: {0}")]
    InvalidPort(u16),
    #[error("proxy_endpoint は '/' で始まる必要があります: {0}")]
    InvalidEndpoint(String),
    #[error("{name} は0より大きい値が必要です")]
    ZeroInterval { name: &'static str },
}

/// コンソールコマンドの適用結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    /// 変更なし
    Unchanged,
    /// アップロード先が変わった（送信クライアントの再作成が必要）
    Proxy,
    /// Wi-Fi認証情報が変わった（再接続が必要）
    Wifi,
}

/// アプリケーション設定を表す構造体
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// デバイスID（アップロード時の識別子）
    pub device_id: String,

    pub wifi_ssid: String,
    pub wifi_password: String,

    /// アップロード先のホスト
    pub proxy_host: String,
    pub proxy_port: u16,
    /// アップロード先のパス（'/' 始まり）
    pub proxy_endpoint: String,

    /// アップロード間隔（ミリ秒）
    pub upload_interval_ms: u64,
    /// 計測ループの周期（ミリ秒）
    pub sample_interval_ms: u64,
    /// 応答待ちタイムアウト（ミリ秒）
    pub response_timeout_ms: u64,
    /// 起動時のコンソール受付時間（ミリ秒）
    pub console_window_ms: u64,

    /// モーションセンサーの代替プロファイル
    pub fallback_profile: OutputProfile,
}

impl AppConfig {
    /// 設定ファイルから設定をロードします
    pub fn load() -> Result<Self, ConfigError> {
        // toml_cfg によって生成された定数
        let config = Self::from_config(&CONFIG);
        config.validate()?;
        Ok(config)
    }

    /// `toml_cfg` の設定値から変換（検証は行わない）
    pub fn from_config(config: &Config) -> Self {
        Self {
            device_id: config.device_id.trim().to_string(),
            wifi_ssid: config.wifi_ssid.to_string(),
            wifi_password: config.wifi_password.to_string(),
            proxy_host: config.proxy_host.trim().to_string(),
            proxy_port: config.proxy_port,
            proxy_endpoint: config.proxy_endpoint.trim().to_string(),
            upload_interval_ms: config.upload_interval_ms,
            sample_interval_ms: config.sample_interval_ms,
            response_timeout_ms: config.response_timeout_ms,
            console_window_ms: config.console_window_ms,
            fallback_profile: OutputProfile {
                accel_ctrl: config.fallback_accel_ctrl,
                gyro_ctrl: config.fallback_gyro_ctrl,
            },
        }
    }

    /// 設定値の妥当性を確認
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_id.is_empty() {
            return Err(ConfigError::EmptyDeviceId);
        }
        if self.proxy_host.is_empty() {
            return Err(ConfigError::EmptyProxyHost);
        }
        if self.proxy_port == 0 {
            return Err(ConfigError::InvalidPort(self.proxy_port));
        }
        if !self.proxy_endpoint.starts_with('/') {
            return Err(ConfigError::InvalidEndpoint(self.proxy_endpoint.clone()));
        }
        for (name, value) in [
            ("upload_interval_ms", self.upload_interval_ms),
            ("sample_interval_ms", self.sample_interval_ms),
            ("response_timeout_ms", self.response_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { name });
            }
        }
        Ok(())
    }

    /// アップロード先のURL
    pub fn upload_url(&self) -> String {
        format!("http://{}:{}{}", self.proxy_host, self.proxy_port, self.proxy_endpoint)
    }

    /// モーションドライバーの初期化パラメータ
    pub fn motion_config(&self) -> MotionConfig {
        MotionConfig {
            fallback_profile: self.fallback_profile,
            ..MotionConfig::default()
        }
    }

    /// コンソールコマンドを適用し、何が変わったかを返す
    pub fn apply_command(&mut self, command: &ConsoleCommand) -> ConfigChange {
        match command {
            ConsoleCommand::SetProxy { host, port } => {
                self.proxy_host = host.clone();
                if let Some(port) = port {
                    self.proxy_port = *port;
                }
                info!("プロキシを設定しました: {}:{}", self.proxy_host, self.proxy_port);
                ConfigChange::Proxy
            }
            ConsoleCommand::SetWifi { ssid, password } => {
                self.wifi_ssid = ssid.clone();
                self.wifi_password = password.clone();
                info!(
                    "Wi-Fi SSIDを設定しました: {} (パスワード長: {})",
                    self.wifi_ssid,
                    self.wifi_password.len()
                );
                ConfigChange::Wifi
            }
            ConsoleCommand::GetConfig | ConsoleCommand::Unknown(_) => ConfigChange::Unchanged,
        }
    }

    /// コンソールから受け取った1行を解析して適用する
    pub fn handle_console_line(&mut self, line: &str) -> ConfigChange {
        match parse_command(line) {
            Ok(ConsoleCommand::GetConfig) => {
                info!("{}", self.summary());
                ConfigChange::Unchanged
            }
            Ok(command) => self.apply_command(&command),
            Err(e) => {
                warn!("コマンドを適用できません: {}", e);
                ConfigChange::Unchanged
            }
        }
    }

    /// `GET CONFIG` の表示内容（パスワードは表示しない）
    pub fn summary(&self) -> String {
        format!(
            "現在の設定:\n  デバイスID: {}\n  Wi-Fi SSID: {}\n  プロキシ: {}:{}{}",
            self.device_id, self.wifi_ssid, self.proxy_host, self.proxy_port, self.proxy_endpoint
        )
    }
}
