//! Capability service abstractions for deskshell.
//!
//! Command handlers never reach platform state directly; they receive these
//! services through the terminal `Environment`, so tests can substitute
//! fakes.

mod services;

pub use services::{
    AppInfo, BatteryState, BluetoothDevice, BluetoothInfo, BluetoothService, DesktopPlatform,
    NetworkService, Notification, NotificationService, PackageService, Platform, PowerInfo,
    PowerService, SystemTime, TimeService, WifiInfo, format_mac, parse_mac,
    system_time_from_unix,
};
