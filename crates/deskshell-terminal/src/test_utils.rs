//! Shared test utilities for the built-in command modules.
//!
//! Provides a [`MockPlatform`] implementing every capability service with
//! fixed, inspectable state, plus a helper that runs one command line
//! through a fully populated registry.

use std::sync::Mutex;
use std::time::Duration;

use deskshell_platform::{
    AppInfo, BatteryState, BluetoothDevice, BluetoothInfo, BluetoothService, NetworkService,
    Notification, NotificationService, PackageService, Platform, PowerInfo, PowerService,
    SystemTime, TimeService, WifiInfo, system_time_from_unix,
};
use deskshell_types::config::ShellConfig;
use deskshell_types::error::{Result, ShellError};

use crate::command::InvocationResult;
use crate::commands::register_builtins;
use crate::environment::Environment;
use crate::registry::CommandRegistry;

/// 2024-02-29 12:34:56 UTC.
pub const NOW: u64 = 1_709_210_096;

/// A mock platform whose state tests can read back after a command runs.
pub struct MockPlatform {
    pub power: PowerInfo,
    pub uptime: u64,
    pub wifi: Mutex<WifiInfo>,
    /// Hosts whose probes fail.
    pub unreachable: Vec<String>,
    pub probes: Mutex<Vec<String>>,
    pub adapter: Mutex<BluetoothInfo>,
    pub devices: Mutex<Vec<BluetoothDevice>>,
    pub apps: Vec<AppInfo>,
    pub launched: Mutex<Vec<String>>,
    pub notifications: Vec<Notification>,
    pub dnd: Mutex<bool>,
}

impl MockPlatform {
    pub fn new() -> Self {
        let posted = system_time_from_unix(NOW - 600);
        Self {
            power: PowerInfo {
                battery_percent: Some(76),
                battery_minutes: Some(210),
                state: BatteryState::Discharging,
                power_saver: false,
            },
            uptime: 93_784,
            wifi: Mutex::new(WifiInfo {
                enabled: true,
                connected: true,
                ssid: Some("HomeNet".into()),
                ip_address: Some("192.168.1.20".into()),
                signal_dbm: Some(-55),
                mac_address: [0x02, 0x00, 0x00, 0xAA, 0xBB, 0xCC],
            }),
            unreachable: vec!["offline.test".into()],
            probes: Mutex::new(Vec::new()),
            adapter: Mutex::new(BluetoothInfo {
                enabled: true,
                name: "Pixel Desk".into(),
                address: [0x10, 0x20, 0x30, 0x40, 0x50, 0x60],
            }),
            devices: Mutex::new(vec![
                BluetoothDevice {
                    name: "Headphones".into(),
                    address: [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x01],
                    connected: false,
                },
                BluetoothDevice {
                    name: "Keyboard".into(),
                    address: [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x02],
                    connected: true,
                },
            ]),
            apps: vec![
                app("org.example.notes", "Notes", false),
                app("org.example.mail", "Mail", false),
                app("com.android.settings", "Settings", true),
                app("org.example.weather", "Weather", false),
            ],
            launched: Mutex::new(Vec::new()),
            notifications: vec![
                Notification {
                    app: "org.example.mail".into(),
                    title: "New message".into(),
                    text: "Lunch tomorrow?".into(),
                    posted,
                },
                Notification {
                    app: "org.example.weather".into(),
                    title: "Rain alert".into(),
                    text: "Showers after 3pm".into(),
                    posted,
                },
                Notification {
                    app: "org.example.mail".into(),
                    title: "Digest".into(),
                    text: "3 unread".into(),
                    posted,
                },
            ],
            dnd: Mutex::new(false),
        }
    }
}

fn app(package: &str, label: &str, system: bool) -> AppInfo {
    AppInfo {
        package: package.into(),
        label: label.into(),
        system,
        version: None,
    }
}

impl PowerService for MockPlatform {
    fn power_info(&self) -> Result<PowerInfo> {
        Ok(self.power.clone())
    }
}

impl TimeService for MockPlatform {
    fn now(&self) -> Result<SystemTime> {
        Ok(system_time_from_unix(NOW))
    }

    fn uptime_secs(&self) -> Result<u64> {
        Ok(self.uptime)
    }
}

impl NetworkService for MockPlatform {
    fn wifi_info(&self) -> Result<WifiInfo> {
        Ok(self.wifi.lock().unwrap().clone())
    }

    fn set_wifi_enabled(&self, enabled: bool) -> Result<()> {
        let mut wifi = self.wifi.lock().unwrap();
        wifi.enabled = enabled;
        wifi.connected = enabled;
        Ok(())
    }

    fn probe(&self, host: &str, _timeout: Duration) -> Result<Duration> {
        self.probes.lock().unwrap().push(host.to_string());
        if self.unreachable.iter().any(|h| h == host) {
            Err(ShellError::Platform(format!("{host}: connection timed out")))
        } else {
            Ok(Duration::from_millis(12))
        }
    }
}

impl BluetoothService for MockPlatform {
    fn adapter_info(&self) -> Result<BluetoothInfo> {
        Ok(self.adapter.lock().unwrap().clone())
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.adapter.lock().unwrap().enabled = enabled;
        Ok(())
    }

    fn paired_devices(&self) -> Result<Vec<BluetoothDevice>> {
        Ok(self.devices.lock().unwrap().clone())
    }

    fn connect(&self, address: [u8; 6]) -> Result<()> {
        let mut devices = self.devices.lock().unwrap();
        let device = devices
            .iter_mut()
            .find(|d| d.address == address)
            .ok_or_else(|| ShellError::Platform("device not bonded".into()))?;
        device.connected = true;
        Ok(())
    }
}

impl PackageService for MockPlatform {
    fn installed_apps(&self) -> Result<Vec<AppInfo>> {
        Ok(self.apps.clone())
    }

    fn launch(&self, package: &str) -> Result<()> {
        self.launched.lock().unwrap().push(package.to_string());
        Ok(())
    }
}

impl NotificationService for MockPlatform {
    fn notifications(&self) -> Result<Vec<Notification>> {
        Ok(self.notifications.clone())
    }

    fn do_not_disturb(&self) -> Result<bool> {
        Ok(*self.dnd.lock().unwrap())
    }

    fn set_do_not_disturb(&self, enabled: bool) -> Result<()> {
        *self.dnd.lock().unwrap() = enabled;
        Ok(())
    }
}

impl Platform for MockPlatform {}

/// A sealed registry holding every built-in command.
pub fn builtin_registry(config: &ShellConfig) -> CommandRegistry {
    let mut reg = CommandRegistry::new();
    register_builtins(&mut reg, config).unwrap();
    reg.seal();
    reg
}

/// Run one line against the mock platform with every service attached.
pub fn run(platform: &MockPlatform, line: &str) -> InvocationResult {
    let config = ShellConfig::default();
    let reg = builtin_registry(&config);
    let env = Environment::with_platform(&config, platform).with_bluetooth(platform);
    reg.execute_line(&env, line)
}

/// Run one line with no services attached at all.
pub fn run_bare(line: &str) -> InvocationResult {
    let config = ShellConfig::default();
    let reg = builtin_registry(&config);
    let env = Environment::new(&config);
    reg.execute_line(&env, line)
}
