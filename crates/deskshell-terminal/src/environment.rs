//! Capabilities handed to every command invocation.

use std::fmt;

use deskshell_platform::{
    BluetoothService, NetworkService, NotificationService, PackageService, Platform,
    PowerService, TimeService,
};
use deskshell_types::config::ShellConfig;
use deskshell_types::error::{Result, ShellError};

/// An external collaborator a command may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Power,
    Time,
    Network,
    Bluetooth,
    Packages,
    Notifications,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Power => write!(f, "power"),
            Self::Time => write!(f, "time"),
            Self::Network => write!(f, "network"),
            Self::Bluetooth => write!(f, "bluetooth"),
            Self::Packages => write!(f, "packages"),
            Self::Notifications => write!(f, "notifications"),
        }
    }
}

/// Shared read-only environment passed to every command.
///
/// Each service is optional; the registry refuses to run a command whose
/// required capabilities are absent.
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    /// Active shell configuration.
    pub config: &'a ShellConfig,
    /// Battery / power queries.
    pub power: Option<&'a dyn PowerService>,
    /// Clock and uptime.
    pub time: Option<&'a dyn TimeService>,
    /// WiFi status and reachability probes.
    pub network: Option<&'a dyn NetworkService>,
    /// Bluetooth adapter.
    pub bluetooth: Option<&'a dyn BluetoothService>,
    /// Installed-app catalog.
    pub packages: Option<&'a dyn PackageService>,
    /// Notification listener.
    pub notifications: Option<&'a dyn NotificationService>,
}

impl<'a> Environment<'a> {
    /// An environment with no services attached.
    pub fn new(config: &'a ShellConfig) -> Self {
        Self {
            config,
            power: None,
            time: None,
            network: None,
            bluetooth: None,
            packages: None,
            notifications: None,
        }
    }

    /// Attach every service a [`Platform`] provides.
    pub fn with_platform<P: Platform>(config: &'a ShellConfig, platform: &'a P) -> Self {
        Self {
            config,
            power: Some(platform),
            time: Some(platform),
            network: Some(platform),
            bluetooth: None,
            packages: Some(platform),
            notifications: Some(platform),
        }
    }

    pub fn with_bluetooth(mut self, bluetooth: &'a dyn BluetoothService) -> Self {
        self.bluetooth = Some(bluetooth);
        self
    }

    /// Whether the given capability is available.
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Power => self.power.is_some(),
            Capability::Time => self.time.is_some(),
            Capability::Network => self.network.is_some(),
            Capability::Bluetooth => self.bluetooth.is_some(),
            Capability::Packages => self.packages.is_some(),
            Capability::Notifications => self.notifications.is_some(),
        }
    }

    pub fn require_power(&self) -> Result<&'a dyn PowerService> {
        self.power.ok_or_else(|| missing(Capability::Power))
    }

    pub fn require_time(&self) -> Result<&'a dyn TimeService> {
        self.time.ok_or_else(|| missing(Capability::Time))
    }

    pub fn require_network(&self) -> Result<&'a dyn NetworkService> {
        self.network.ok_or_else(|| missing(Capability::Network))
    }

    pub fn require_bluetooth(&self) -> Result<&'a dyn BluetoothService> {
        self.bluetooth.ok_or_else(|| missing(Capability::Bluetooth))
    }

    pub fn require_packages(&self) -> Result<&'a dyn PackageService> {
        self.packages.ok_or_else(|| missing(Capability::Packages))
    }

    pub fn require_notifications(&self) -> Result<&'a dyn NotificationService> {
        self.notifications
            .ok_or_else(|| missing(Capability::Notifications))
    }
}

fn missing(capability: Capability) -> ShellError {
    ShellError::Unsupported(format!("no {capability} service available"))
}
