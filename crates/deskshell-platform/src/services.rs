//! Capability service traits and desktop implementation.
//!
//! Every trait is `Send + Sync`: services are shared by reference across
//! concurrent command invocations, so implementations that mutate state do
//! so behind their own locks.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use deskshell_types::config::AppEntry;
use deskshell_types::error::{Result, ShellError};

// ---------------------------------------------------------------------------
// Power service
// ---------------------------------------------------------------------------

/// Battery / power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryState {
    /// Running on battery.
    Discharging,
    /// Plugged in and charging.
    Charging,
    /// Fully charged, on external power.
    Full,
    /// No battery present (desktop / wall power).
    NoBattery,
}

impl std::fmt::Display for BatteryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discharging => write!(f, "discharging"),
            Self::Charging => write!(f, "charging"),
            Self::Full => write!(f, "full"),
            Self::NoBattery => write!(f, "no battery"),
        }
    }
}

/// Snapshot of power-related information.
#[derive(Debug, Clone)]
pub struct PowerInfo {
    /// Battery charge percentage (0-100), or `None` if no battery.
    pub battery_percent: Option<u8>,
    /// Estimated minutes remaining, or `None` if unknown/charging.
    pub battery_minutes: Option<u32>,
    /// Current battery state.
    pub state: BatteryState,
    /// Whether the platform power-saver mode is on.
    pub power_saver: bool,
}

/// Abstraction over platform power management.
pub trait PowerService: Send + Sync {
    /// Query current power information.
    fn power_info(&self) -> Result<PowerInfo>;
}

// ---------------------------------------------------------------------------
// Time service
// ---------------------------------------------------------------------------

/// A simple wall-clock timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl std::fmt::Display for SystemTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second,
        )
    }
}

/// Abstraction over platform time services.
pub trait TimeService: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> Result<SystemTime>;

    /// Seconds since the platform booted (or the process started).
    fn uptime_secs(&self) -> Result<u64>;
}

// ---------------------------------------------------------------------------
// Network service
// ---------------------------------------------------------------------------

/// WiFi / network connection status.
#[derive(Debug, Clone)]
pub struct WifiInfo {
    /// Whether the WiFi radio is switched on.
    pub enabled: bool,
    /// Whether WiFi is connected to an access point.
    pub connected: bool,
    /// Network name (if connected).
    pub ssid: Option<String>,
    /// Assigned IP address (if connected).
    pub ip_address: Option<String>,
    /// Received signal strength in dBm (if connected).
    pub signal_dbm: Option<i32>,
    /// MAC address as 6 bytes.
    pub mac_address: [u8; 6],
}

/// Abstraction over platform WiFi and connectivity.
pub trait NetworkService: Send + Sync {
    /// Query WiFi radio and connection status.
    fn wifi_info(&self) -> Result<WifiInfo>;

    /// Switch the WiFi radio on or off.
    fn set_wifi_enabled(&self, _enabled: bool) -> Result<()> {
        Err(ShellError::Unsupported(
            "WiFi control is not available on this platform".into(),
        ))
    }

    /// Probe reachability of `host`, returning the round-trip latency.
    fn probe(&self, host: &str, timeout: Duration) -> Result<Duration>;
}

// ---------------------------------------------------------------------------
// Bluetooth service
// ---------------------------------------------------------------------------

/// Local Bluetooth adapter state.
#[derive(Debug, Clone)]
pub struct BluetoothInfo {
    /// Whether the adapter is switched on.
    pub enabled: bool,
    /// Advertised adapter name.
    pub name: String,
    /// Adapter address.
    pub address: [u8; 6],
}

/// A bonded (paired) remote device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BluetoothDevice {
    pub name: String,
    pub address: [u8; 6],
    pub connected: bool,
}

/// Abstraction over the platform Bluetooth adapter.
pub trait BluetoothService: Send + Sync {
    /// Query adapter state.
    fn adapter_info(&self) -> Result<BluetoothInfo>;

    /// Switch the adapter on or off.
    fn set_enabled(&self, enabled: bool) -> Result<()>;

    /// List bonded devices.
    fn paired_devices(&self) -> Result<Vec<BluetoothDevice>>;

    /// Connect to a bonded device.
    fn connect(&self, address: [u8; 6]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Package service
// ---------------------------------------------------------------------------

/// An installed application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub package: String,
    pub label: String,
    pub system: bool,
    pub version: Option<String>,
}

impl From<&AppEntry> for AppInfo {
    fn from(entry: &AppEntry) -> Self {
        Self {
            package: entry.package.clone(),
            label: entry.label.clone(),
            system: entry.system,
            version: None,
        }
    }
}

/// Abstraction over the installed-package catalog.
pub trait PackageService: Send + Sync {
    /// List installed applications.
    fn installed_apps(&self) -> Result<Vec<AppInfo>>;

    /// Look up one installed application by package name.
    fn app(&self, package: &str) -> Result<Option<AppInfo>> {
        Ok(self
            .installed_apps()?
            .into_iter()
            .find(|a| a.package == package))
    }

    /// Bring an application to the foreground.
    fn launch(&self, package: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Notification service
// ---------------------------------------------------------------------------

/// A posted notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Package that posted the notification.
    pub app: String,
    pub title: String,
    pub text: String,
    pub posted: SystemTime,
}

/// Abstraction over the notification listener.
pub trait NotificationService: Send + Sync {
    /// Active notifications, newest first.
    fn notifications(&self) -> Result<Vec<Notification>>;

    /// Whether do-not-disturb is on.
    fn do_not_disturb(&self) -> Result<bool>;

    /// Turn do-not-disturb on or off.
    fn set_do_not_disturb(&self, enabled: bool) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Unified platform trait
// ---------------------------------------------------------------------------

/// Aggregate trait providing access to all platform services.
pub trait Platform:
    PowerService + TimeService + NetworkService + PackageService + NotificationService
{
}

// ---------------------------------------------------------------------------
// Desktop implementation
// ---------------------------------------------------------------------------

/// Default platform implementation for desktop hosts using `std` facilities.
///
/// There is no battery, radio control, or Bluetooth adapter; the app catalog
/// comes from configuration and notifications are posted in-process.
pub struct DesktopPlatform {
    start_time: Instant,
    apps: Vec<AppInfo>,
    notifications: Mutex<Vec<Notification>>,
    dnd: AtomicBool,
}

impl DesktopPlatform {
    pub fn new(apps: &[AppEntry]) -> Self {
        Self {
            start_time: Instant::now(),
            apps: apps.iter().map(AppInfo::from).collect(),
            notifications: Mutex::new(Vec::new()),
            dnd: AtomicBool::new(false),
        }
    }

    /// Post a notification; it becomes the newest entry.
    ///
    /// The app posts configured startup notifications through this, and
    /// embedders may call it at any time.
    pub fn post(&self, app: &str, title: &str, text: &str) -> Result<()> {
        let posted = self.now()?;
        let mut list = self
            .notifications
            .lock()
            .map_err(|_| ShellError::Platform("notification store poisoned".into()))?;
        list.insert(
            0,
            Notification {
                app: app.to_string(),
                title: title.to_string(),
                text: text.to_string(),
                posted,
            },
        );
        Ok(())
    }
}

impl Default for DesktopPlatform {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl PowerService for DesktopPlatform {
    fn power_info(&self) -> Result<PowerInfo> {
        // Desktop: wall power, no battery.
        Ok(PowerInfo {
            battery_percent: None,
            battery_minutes: None,
            state: BatteryState::NoBattery,
            power_saver: false,
        })
    }
}

impl TimeService for DesktopPlatform {
    fn now(&self) -> Result<SystemTime> {
        use std::time::SystemTime as StdTime;
        let dur = StdTime::now()
            .duration_since(StdTime::UNIX_EPOCH)
            .unwrap_or_default();
        Ok(system_time_from_unix(dur.as_secs()))
    }

    fn uptime_secs(&self) -> Result<u64> {
        Ok(self.start_time.elapsed().as_secs())
    }
}

impl NetworkService for DesktopPlatform {
    fn wifi_info(&self) -> Result<WifiInfo> {
        Ok(WifiInfo {
            enabled: false,
            connected: false,
            ssid: None,
            ip_address: None,
            signal_dbm: None,
            mac_address: [0; 6],
        })
    }

    fn probe(&self, host: &str, timeout: Duration) -> Result<Duration> {
        // No raw ICMP without privileges; a TCP handshake on port 80 stands in.
        let target = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:80")
        } else {
            format!("{host}:80")
        };
        let addr = target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| ShellError::Platform(format!("cannot resolve {host}")))?;
        let start = Instant::now();
        TcpStream::connect_timeout(&addr, timeout)?;
        Ok(start.elapsed())
    }
}

impl PackageService for DesktopPlatform {
    fn installed_apps(&self) -> Result<Vec<AppInfo>> {
        Ok(self.apps.clone())
    }

    fn launch(&self, package: &str) -> Result<()> {
        if !self.apps.iter().any(|a| a.package == package) {
            return Err(ShellError::Platform(format!(
                "package not installed: {package}"
            )));
        }
        log::info!("Launching app: {package}");
        Ok(())
    }
}

impl NotificationService for DesktopPlatform {
    fn notifications(&self) -> Result<Vec<Notification>> {
        self.notifications
            .lock()
            .map(|list| list.clone())
            .map_err(|_| ShellError::Platform("notification store poisoned".into()))
    }

    fn do_not_disturb(&self) -> Result<bool> {
        Ok(self.dnd.load(Ordering::Relaxed))
    }

    fn set_do_not_disturb(&self, enabled: bool) -> Result<()> {
        self.dnd.store(enabled, Ordering::Relaxed);
        Ok(())
    }
}

impl Platform for DesktopPlatform {}

// ---------------------------------------------------------------------------
// MAC address helpers
// ---------------------------------------------------------------------------

/// Format a MAC address as upper-case colon-separated hex.
pub fn format_mac(mac: &[u8; 6]) -> String {
    format!(
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

/// Parse `AA:BB:CC:DD:EE:FF` (or `-`-separated) into bytes.
pub fn parse_mac(text: &str) -> Option<[u8; 6]> {
    let sep = if text.contains('-') { '-' } else { ':' };
    let mut out = [0u8; 6];
    let mut count = 0;
    for part in text.split(sep) {
        if count == 6 || part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        out[count] = u8::from_str_radix(part, 16).ok()?;
        count += 1;
    }
    (count == 6).then_some(out)
}

// ---------------------------------------------------------------------------
// Date helpers
// ---------------------------------------------------------------------------

/// Break seconds since the Unix epoch into a UTC wall-clock time.
pub fn system_time_from_unix(secs: u64) -> SystemTime {
    let days = secs / 86400;
    let time_of_day = secs % 86400;
    let (year, month, day) = days_to_ymd(days);
    SystemTime {
        year,
        month,
        day,
        hour: (time_of_day / 3600) as u8,
        minute: ((time_of_day % 3600) / 60) as u8,
        second: (time_of_day % 60) as u8,
    }
}

/// Convert days since Unix epoch to (year, month, day).
pub(crate) fn days_to_ymd(mut days: u64) -> (u16, u8, u8) {
    let mut year = 1970u16;
    loop {
        let year_days = if is_leap(year) { 366 } else { 365 };
        if days < year_days {
            break;
        }
        days -= year_days;
        year += 1;
    }
    let leap = is_leap(year);
    let month_days: [u64; 12] = [
        31,
        if leap { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];
    let mut month = 0u8;
    for (i, &md) in month_days.iter().enumerate() {
        if days < md {
            month = (i + 1) as u8;
            break;
        }
        days -= md;
    }
    if month == 0 {
        month = 12;
    }
    (year, month, (days + 1) as u8)
}

pub(crate) fn is_leap(y: u16) -> bool {
    (y.is_multiple_of(4) && !y.is_multiple_of(100)) || y.is_multiple_of(400)
}

// ---------------------------------------------------------------------------
// In-module tests
// ---------------------------------------------------------------------------
