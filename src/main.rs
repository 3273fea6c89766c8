#[cfg(any(target_arch = "riscv32", target_arch = "xtensa"))]
mod firmware {
    use esp_idf_svc::{
        eventloop::EspSystemEventLoop,
        hal::{
            delay::{Delay, FreeRtos},
            i2c::{I2cConfig, I2cDriver},
            peripherals::Peripherals,
            prelude::*,
        },
        nvs::EspDefaultNvsPartition,
    };
    use log::{error, info};

    use env_sensors::MonotonicClock;
    use monitor_core::{DisplayAggregator, SensorMonitor};
    use sensor_telemetry_node::platform::{AdcMicrophone, Console, HttpTransport, SystemClock, WifiLink};
    use sensor_telemetry_node::{AppConfig, ConfigChange, ReadingPayload, SensorSuite, UploadOutcome, Uploader};

    /// 起動時コンソールのポーリング間隔
    const CONSOLE_POLL_INTERVAL_MS: u32 = 50;

    /// 起動直後の一定時間だけコマンド入力を待つ
    fn run_console_window(console: &mut Console<'_>, config: &mut AppConfig, clock: &SystemClock) {
        info!(
            "{}秒間コマンドを受け付けます (SET PROXY host[:port] / SET WIFI ssid password / GET CONFIG)",
            config.console_window_ms / 1000
        );
        let start = clock.now_ms();
        while clock.now_ms().saturating_sub(start) < config.console_window_ms {
            for line in console.poll() {
                config.handle_console_line(&line);
            }
            FreeRtos::delay_ms(CONSOLE_POLL_INTERVAL_MS);
        }
    }

    pub fn run() -> anyhow::Result<()> {
        // ESP-IDFの基本初期化
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();

        // 設定ファイル読み込み
        let mut app_config = AppConfig::load().map_err(|e| {
            error!("設定ファイルの読み込みに失敗しました: {}", e);
            anyhow::anyhow!("設定ファイルの読み込みエラー: {}", e)
        })?;
        info!("デバイスID: {}", app_config.device_id);

        info!("ペリフェラルを初期化しています");
        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs_partition = EspDefaultNvsPartition::take()?;
        let pins = peripherals.pins;
        let clock = SystemClock;

        let mut console = Console::new(peripherals.usb_serial, pins.gpio19, pins.gpio20)?;
        run_console_window(&mut console, &mut app_config, &clock);

        // I2C (SDA: GPIO5, SCL: GPIO6)
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            pins.gpio5,
            pins.gpio6,
            &I2cConfig::new().baudrate(400.kHz().into()),
        )?;
        let microphone = AdcMicrophone::new(peripherals.adc1, pins.gpio1)?;
        let mut delay = Delay::new_default();

        let mut sensors = SensorSuite::new(i2c, microphone, app_config.motion_config());
        sensors.initialize(&mut delay);

        let mut wifi = WifiLink::new(peripherals.modem, &sysloop, &nvs_partition)?;
        if let Err(e) = wifi.connect(&app_config.wifi_ssid, &app_config.wifi_password) {
            error!("Wi-Fiの設定に失敗しました: {}", e);
        }

        let mut uploader = Uploader::new(
            HttpTransport,
            app_config.upload_url(),
            app_config.upload_interval_ms,
            app_config.response_timeout_ms,
        );
        info!("送信先: {}", uploader.url());

        let mut monitor = SensorMonitor::new();
        let mut display = DisplayAggregator::new();

        info!("=== 計測ループを開始します ===");
        loop {
            for line in console.poll() {
                match app_config.handle_console_line(&line) {
                    ConfigChange::Proxy => uploader.reconfigure(app_config.upload_url()),
                    ConfigChange::Wifi => {
                        if let Err(e) = wifi.connect(&app_config.wifi_ssid, &app_config.wifi_password) {
                            error!("Wi-Fiの再接続に失敗しました: {}", e);
                        }
                    }
                    ConfigChange::Unchanged => {}
                }
            }

            let now = clock.now_ms();
            let tick = sensors.tick(&mut delay, now);
            let motion = tick.motion.motion_magnitude;
            let sound = f32::from(tick.sound_level);

            display.add(tick.temperature(), tick.humidity(), motion, sound, now);
            if let Some(frame) = display.frame(tick.angles(), now) {
                info!("{}", frame);
            }

            monitor.add_sample(tick.temperature(), tick.humidity(), motion, sound, now);
            monitor.analyze(now);

            if wifi.is_connected() {
                let payload = ReadingPayload::from_tick(&app_config.device_id, &tick);
                // 失敗はアップローダー側で記録済み
                if let Ok(UploadOutcome::Sent { status }) = uploader.upload(&payload, now) {
                    let (sent, failed) = uploader.stats();
                    info!("✓ 送信完了: HTTP {} (成功 {} / 失敗 {})", status, sent, failed);
                }
            }

            FreeRtos::delay_ms(app_config.sample_interval_ms as u32);
        }
    }
}

#[cfg(any(target_arch = "riscv32", target_arch = "xtensa"))]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(any(target_arch = "riscv32", target_arch = "xtensa")))]
fn main() {
    println!("このバイナリはESP-IDFターゲット向けです。ホストでは `cargo test` を使用してください。");
}
