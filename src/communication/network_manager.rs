use std::net::Ipv4Addr;
use std::sync::Arc;

use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::netif::IpEvent;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{esp, esp_wifi_connect, EspError};
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiEvent};
use log::info;

use crate::communication::wifi::{StationDriver, StationEvent, StationEventHandler};
use crate::core::config::AppConfig;
use crate::core::config_validation::AuthThreshold;
use crate::core::{BootError, ConnectionSignal, WaitOutcome};

/// `esp_wifi_connect` を呼ぶだけのドライバ
pub struct EspStationDriver;

impl StationDriver for EspStationDriver {
    type Error = EspError;

    fn request_connect(&self) -> Result<(), EspError> {
        esp!(unsafe { esp_wifi_connect() })
    }
}

/// 接続済みのステーション
///
/// イベント購読を保持しているため、破棄すると再接続も止まる。
pub struct StationLink {
    wifi: EspWifi<'static>,
    signal: ConnectionSignal,
    _wifi_subscription: EspSubscription<'static, System>,
    _ip_subscription: EspSubscription<'static, System>,
}

impl StationLink {
    pub fn signal(&self) -> &ConnectionSignal {
        &self.signal
    }

    pub fn ip(&self) -> anyhow::Result<Ipv4Addr> {
        let ip_info = self.wifi.sta_netif().get_ip_info()?;
        Ok(Ipv4Addr::from(ip_info.ip.octets()))
    }
}

/// WiFi ステーションの初期化を管理するモジュール
pub struct NetworkManager;

impl NetworkManager {
    /// ステーションモードで起動し、IPを取得するまで待機する
    pub fn connect_station(
        modem: Modem,
        sysloop: &EspSystemEventLoop,
        nvs_partition: EspDefaultNvsPartition,
        config: &AppConfig,
        signal: ConnectionSignal,
    ) -> Result<StationLink, BootError> {
        let wifi_err = |e: EspError| BootError::Wifi(format!("{:?}", e));

        let mut wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs_partition)).map_err(wifi_err)?;

        let handler = Arc::new(StationEventHandler::new(EspStationDriver, signal.clone()));

        let wifi_handler = Arc::clone(&handler);
        let wifi_subscription = sysloop
            .subscribe::<WifiEvent, _>(move |event| {
                let event = match event {
                    WifiEvent::StaStarted => StationEvent::Started,
                    WifiEvent::StaDisconnected(_) => StationEvent::Disconnected,
                    _ => StationEvent::Other,
                };
                wifi_handler.handle(event);
            })
            .map_err(wifi_err)?;

        let ip_handler = Arc::clone(&handler);
        let ip_subscription = sysloop
            .subscribe::<IpEvent, _>(move |event| {
                if let IpEvent::DhcpIpAssigned(assignment) = event {
                    ip_handler.handle(StationEvent::GotIp(Ipv4Addr::from(assignment.ip().octets())));
                }
            })
            .map_err(wifi_err)?;

        let client_config = ClientConfiguration {
            ssid: config
                .wifi_ssid
                .as_str()
                .try_into()
                .map_err(|_| BootError::Wifi(format!("SSIDが不正です: {}", config.wifi_ssid)))?,
            password: config
                .wifi_password
                .as_str()
                .try_into()
                .map_err(|_| BootError::Wifi("パスワードが不正です".to_string()))?,
            auth_method: auth_method(config.wifi_auth),
            ..Default::default()
        };

        wifi.set_configuration(&Configuration::Client(client_config))
            .map_err(wifi_err)?;
        wifi.start().map_err(wifi_err)?;

        info!("WiFi initialization finished. Connecting to {} ...", config.wifi_ssid);

        match signal.wait(config.wifi_connect_timeout) {
            WaitOutcome::Connected => info!("✓ Connected to AP"),
            WaitOutcome::TimedOut => {
                return Err(BootError::WifiTimeout(
                    config.wifi_connect_timeout.unwrap_or_default(),
                ))
            }
            WaitOutcome::Cancelled => return Err(BootError::WifiCancelled),
        }

        Ok(StationLink {
            wifi,
            signal,
            _wifi_subscription: wifi_subscription,
            _ip_subscription: ip_subscription,
        })
    }
}

fn auth_method(threshold: AuthThreshold) -> AuthMethod {
    match threshold {
        AuthThreshold::Open => AuthMethod::None,
        AuthThreshold::Wep => AuthMethod::WEP,
        AuthThreshold::Wpa => AuthMethod::WPA,
        AuthThreshold::Wpa2 => AuthMethod::WPA2Personal,
        AuthThreshold::WpaWpa2 => AuthMethod::WPAWPA2Personal,
        AuthThreshold::Wpa3 => AuthMethod::WPA3Personal,
        AuthThreshold::Wpa2Wpa3 => AuthMethod::WPA2WPA3Personal,
    }
}
