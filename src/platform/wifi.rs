use anyhow::anyhow;
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{delay::FreeRtos, modem::Modem},
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};
use log::{info, warn};

/// 接続試行回数
pub const CONNECT_ATTEMPTS: u32 = 20;
/// 試行間隔（ミリ秒）
pub const CONNECT_INTERVAL_MS: u32 = 500;

/// Wi-Fi（STAモード）の接続管理
pub struct WifiLink {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl WifiLink {
    pub fn new(
        modem: Modem,
        sysloop: &EspSystemEventLoop,
        nvs_partition: &EspDefaultNvsPartition,
    ) -> anyhow::Result<Self> {
        let wifi = BlockingWifi::wrap(
            EspWifi::new(modem, sysloop.clone(), Some(nvs_partition.clone()))?,
            sysloop.clone(),
        )?;
        Ok(Self { wifi })
    }

    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    /// 指定の認証情報で接続する（既存の接続は切断）
    ///
    /// 全試行に失敗した場合は `Ok(false)` を返し、オフラインで計測を続けます。
    pub fn connect(&mut self, ssid: &str, password: &str) -> anyhow::Result<bool> {
        if ssid.is_empty() {
            warn!("Wi-Fi SSIDが未設定のため接続しません（SET WIFI で設定できます）");
            return Ok(false);
        }

        if self.wifi.is_started()? {
            if self.wifi.is_connected()? {
                self.wifi.disconnect()?;
            }
            self.wifi.stop()?;
        }

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        self.wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| anyhow!("SSIDが長すぎます: {}", ssid))?,
            password: password
                .try_into()
                .map_err(|_| anyhow!("パスワードが長すぎます"))?,
            auth_method,
            ..Default::default()
        }))?;
        self.wifi.start()?;

        info!("Wi-Fiに接続中: {}", ssid);
        for attempt in 1..=CONNECT_ATTEMPTS {
            match self.wifi.connect().and_then(|_| self.wifi.wait_netif_up()) {
                Ok(()) => {
                    let ip_info = self.wifi.wifi().sta_netif().get_ip_info()?;
                    info!("✓ Wi-Fi接続完了 (IP: {})", ip_info.ip);
                    return Ok(true);
                }
                Err(e) => {
                    warn!("Wi-Fi接続失敗 ({}/{}): {}", attempt, CONNECT_ATTEMPTS, e);
                    FreeRtos::delay_ms(CONNECT_INTERVAL_MS);
                }
            }
        }

        warn!("Wi-Fiに接続できませんでした。オフラインで計測を続けます");
        Ok(false)
    }
}
