use esp_idf_svc::hal::delay::NON_BLOCK;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::usb_serial::{UsbDMinGpio, UsbDPlusGpio, UsbSerialConfig, UsbSerialDriver, USB_SERIAL};
use esp_idf_svc::sys;
use log::{debug, warn};
use monitor_core::LineAssembler;

/// USBシリアル経由のコマンド入力
pub struct Console<'d> {
    driver: UsbSerialDriver<'d>,
    assembler: LineAssembler,
}

impl<'d> Console<'d> {
    /// # 引数
    ///
    /// * `usb_serial` - USBシリアルペリフェラル
    /// * `pin_d_minus` - USBのD-ピン (ESP32-S3ではGPIO19)
    /// * `pin_d_plus` - USBのD+ピン (ESP32-S3ではGPIO20)
    pub fn new(
        usb_serial: impl Peripheral<P = USB_SERIAL> + 'd,
        pin_d_minus: impl Peripheral<P = UsbDMinGpio> + 'd,
        pin_d_plus: impl Peripheral<P = UsbDPlusGpio> + 'd,
    ) -> anyhow::Result<Self> {
        let mut config = UsbSerialConfig::new();
        config.rx_buffer_size = 512;
        let driver = UsbSerialDriver::new(usb_serial, pin_d_minus, pin_d_plus, &config)?;
        debug!("USBシリアルコンソールを初期化しました");
        Ok(Self {
            driver,
            assembler: LineAssembler::new(),
        })
    }

    /// 受信済みのバイトを読み、完成した行を返す（待たない）
    pub fn poll(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut buffer = [0u8; 64];
        loop {
            match self.driver.read(&mut buffer, NON_BLOCK) {
                Ok(0) => break,
                Ok(n) => lines.extend(self.assembler.extend(&buffer[..n])),
                Err(e) if e.code() == sys::ESP_ERR_TIMEOUT => break,
                Err(e) => {
                    warn!("コンソール読み取りエラー: {}", e);
                    break;
                }
            }
        }
        lines
    }
}
