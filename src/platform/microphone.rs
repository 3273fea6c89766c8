use env_sensors::AnalogInput;
use esp_idf_svc::hal::{
    adc::{
        attenuation::DB_11,
        oneshot::{config::AdcChannelConfig, AdcChannelDriver, AdcDriver},
        ADC1,
    },
    gpio::Gpio1,
};
use esp_idf_svc::sys::EspError;
use log::info;

/// 12ビットADCの値を0〜1023に縮める
const ADC_SHIFT: u32 = 2;

/// アナログマイク（ADC1 / GPIO1 のワンショット読み取り）
pub struct AdcMicrophone {
    channel: AdcChannelDriver<'static, Gpio1, AdcDriver<'static, ADC1>>,
}

impl AdcMicrophone {
    pub fn new(adc1: ADC1, gpio1: Gpio1) -> anyhow::Result<Self> {
        info!("マイク用ADC1を初期化しています (GPIO1)");
        let adc_driver = AdcDriver::new(adc1)?;
        let adc_config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        let channel = AdcChannelDriver::new(adc_driver, gpio1, &adc_config)?;
        Ok(Self { channel })
    }
}

impl AnalogInput for AdcMicrophone {
    type Error = EspError;

    fn read_raw(&mut self) -> Result<u16, Self::Error> {
        Ok(self.channel.read_raw()? >> ADC_SHIFT)
    }
}
