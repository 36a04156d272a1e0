//! Server status flags and their textual form.
//!
//! A server's status is a set of independent boolean flags packed into one
//! integer. The textual form lists the set flags separated by `", "` in a fixed
//! order: role and administrative flags first, then exactly one of `Running`
//! or `Down`.
//!
//! ```
//! use proxy_registry::server::{ServerStatus, StatusFlag};
//!
//! let mut status = ServerStatus::default();
//! assert_eq!(status.to_string(), "Running");
//!
//! status.set(StatusFlag::Master);
//! assert_eq!(status.to_string(), "Master, Running");
//!
//! status.clear(StatusFlag::Master);
//! assert_eq!(status.to_string(), "Running");
//! ```

use serde::{Serialize, Serializer};
use std::fmt;

/// A single named status flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFlag {
    /// The server answers connections
    Running,
    /// Replication master
    Master,
    /// Replication slave
    Slave,
    /// Synced member of a Galera cluster
    Synced,
    /// Member of an NDB cluster
    Ndb,
    /// Administratively excluded from routing
    Maintenance,
    /// Slave of a master outside the monitored set
    SlaveOfExternalMaster,
    /// Status is left over from before a monitor lost contact
    StaleStatus,
    /// Master role kept although the cluster changed
    MasterStickiness,
    /// The monitor failed to authenticate
    AuthError,
    /// Slave kept as stale after losing its master
    StaleSlave,
    /// Slave that is also master for further slaves
    RelayMaster,
}

impl StatusFlag {
    /// Render order for flags other than `Running`.
    pub const RENDER_ORDER: [StatusFlag; 11] = [
        StatusFlag::Maintenance,
        StatusFlag::Master,
        StatusFlag::RelayMaster,
        StatusFlag::Slave,
        StatusFlag::Synced,
        StatusFlag::Ndb,
        StatusFlag::SlaveOfExternalMaster,
        StatusFlag::StaleStatus,
        StatusFlag::MasterStickiness,
        StatusFlag::AuthError,
        StatusFlag::StaleSlave,
    ];

    /// Bit occupied by the flag
    pub const fn bit(self) -> u32 {
        match self {
            StatusFlag::Running => 0x0001,
            StatusFlag::Master => 0x0002,
            StatusFlag::Slave => 0x0004,
            StatusFlag::Synced => 0x0008,
            StatusFlag::Ndb => 0x0010,
            StatusFlag::Maintenance => 0x0020,
            StatusFlag::SlaveOfExternalMaster => 0x0040,
            StatusFlag::StaleStatus => 0x0080,
            StatusFlag::MasterStickiness => 0x0100,
            StatusFlag::AuthError => 0x1000,
            StatusFlag::StaleSlave => 0x2000,
            StatusFlag::RelayMaster => 0x4000,
        }
    }

    /// Human readable name
    pub const fn label(self) -> &'static str {
        match self {
            StatusFlag::Running => "Running",
            StatusFlag::Master => "Master",
            StatusFlag::Slave => "Slave",
            StatusFlag::Synced => "Synced",
            StatusFlag::Ndb => "NDB",
            StatusFlag::Maintenance => "Maintenance",
            StatusFlag::SlaveOfExternalMaster => "Slave of External Server",
            StatusFlag::StaleStatus => "Stale Status",
            StatusFlag::MasterStickiness => "Master Stickiness",
            StatusFlag::AuthError => "Auth Error",
            StatusFlag::StaleSlave => "Stale Slave",
            StatusFlag::RelayMaster => "Relay Master",
        }
    }

    /// Map a single textual token to a flag.
    ///
    /// Matching is case-insensitive; `maint` is accepted for `Maintenance`.
    pub fn from_label(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("maint") {
            return Some(StatusFlag::Maintenance);
        }
        std::iter::once(StatusFlag::Running)
            .chain(Self::RENDER_ORDER)
            .find(|flag| flag.label().eq_ignore_ascii_case(token))
    }
}

const KNOWN_BITS: u32 = {
    let mut bits = StatusFlag::Running.bit();
    let mut i = 0;
    while i < StatusFlag::RENDER_ORDER.len() {
        bits |= StatusFlag::RENDER_ORDER[i].bit();
        i += 1;
    }
    bits
};

/// Bitmask of [`StatusFlag`]s.
///
/// The default status is `Running` with no other flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerStatus(u32);

impl ServerStatus {
    /// A status with no flags at all, rendered as `Down`
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build a status from raw bits, dropping bits that name no flag
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & KNOWN_BITS)
    }

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether `flag` is set
    pub const fn contains(self, flag: StatusFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Set `flag`
    pub fn set(&mut self, flag: StatusFlag) {
        self.0 |= flag.bit();
    }

    /// Clear `flag`
    pub fn clear(&mut self, flag: StatusFlag) {
        self.0 &= !flag.bit();
    }

    /// Parse the comma separated textual form.
    ///
    /// Unknown tokens are skipped so that files written by newer versions
    /// still load. `Down` contributes no bits.
    pub fn parse(text: &str) -> Self {
        let mut status = Self::empty();
        for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token.eq_ignore_ascii_case("down") {
                continue;
            }
            match StatusFlag::from_label(token) {
                Some(flag) => status.set(flag),
                None => tracing::debug!(token = %token, "Ignoring unknown status flag"),
            }
        }
        status
    }

    /// Server answers connections
    pub const fn is_running(self) -> bool {
        self.contains(StatusFlag::Running)
    }

    /// Server is a replication master
    pub const fn is_master(self) -> bool {
        self.contains(StatusFlag::Master)
    }

    /// Server is a replication slave
    pub const fn is_slave(self) -> bool {
        self.contains(StatusFlag::Slave)
    }

    /// Server is in maintenance mode
    pub const fn is_in_maintenance(self) -> bool {
        self.contains(StatusFlag::Maintenance)
    }

    /// Running and not in maintenance
    pub const fn is_usable(self) -> bool {
        self.is_running() && !self.is_in_maintenance()
    }
}

impl Default for ServerStatus {
    fn default() -> Self {
        Self(StatusFlag::Running.bit())
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in StatusFlag::RENDER_ORDER {
            if self.contains(flag) {
                write!(f, "{}, ", flag.label())?;
            }
        }
        if self.is_running() {
            f.write_str(StatusFlag::Running.label())
        } else {
            f.write_str("Down")
        }
    }
}

impl Serialize for ServerStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
