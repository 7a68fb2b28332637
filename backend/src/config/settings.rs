//! Canonical settings - the validated, typed view of one reconciliation pass
//!
//! # Critical Invariants
//!
//! - **Valid by construction**: values only come out of
//!   [`validate`](super::validate); every address and key has been parsed
//! - **IMSI range fits**: `imsi + (subscriber_count - 1)` is still a 15-digit IMSI
//! - **Never persisted**: rebuilt from options and relation data on every pass

use ipnetwork::IpNetwork;
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;

// ============================================================================
// IMSI
// ============================================================================

/// International Mobile Subscriber Identity, always exactly 15 digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Imsi(u64);

impl Imsi {
    pub const DIGITS: usize = 15;
    pub const MAX: u64 = 999_999_999_999_999;

    /// Parse a 15-digit numeric string
    ///
    /// # Example
    /// ```
    /// use gnbsim_operator_core_rs::config::Imsi;
    ///
    /// let imsi = Imsi::parse("001010100007487").unwrap();
    /// assert_eq!(imsi.to_string(), "001010100007487");
    /// assert!(Imsi::parse("12345").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.len() != Self::DIGITS || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("must be a {}-digit numeric string", Self::DIGITS));
        }
        raw.parse::<u64>()
            .map(Imsi)
            .map_err(|e| format!("not a number: {}", e))
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// IMSI `offset` positions after this one, or `None` past 15 digits
    pub fn checked_offset(&self, offset: u64) -> Option<Imsi> {
        self.0
            .checked_add(offset)
            .filter(|value| *value <= Self::MAX)
            .map(Imsi)
    }
}

impl fmt::Display for Imsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:015}", self.0)
    }
}

impl Serialize for Imsi {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// Fixed-length hex values
// ============================================================================

/// Lowercase hex string of exactly `LEN` characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixedHex<const LEN: usize>(String);

/// USIM permanent key (K) or operator key (OPc), 128 bits
pub type UsimKey = FixedHex<32>;

/// USIM sequence number (SQN), 48 bits
pub type SequenceNumber = FixedHex<12>;

/// Slice Differentiator, 24 bits
pub type SliceDifferentiator = FixedHex<6>;

impl<const LEN: usize> FixedHex<LEN> {
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.len() != LEN {
            return Err(format!(
                "must be {} hex characters, got {}",
                LEN,
                raw.len()
            ));
        }
        if !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err("must contain only hex characters".to_string());
        }
        Ok(FixedHex(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const LEN: usize> fmt::Display for FixedHex<LEN> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const LEN: usize> Serialize for FixedHex<LEN> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// ============================================================================
// Network identity
// ============================================================================

/// Public Land Mobile Network identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plmn {
    /// Mobile Country Code, 3 digits
    pub mcc: String,
    /// Mobile Network Code, 2 or 3 digits
    pub mnc: String,
}

/// Network slice (S-NSSAI)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub sst: u8,
    pub sd: SliceDifferentiator,
}

/// Tracking Area Code (24 bits, non-zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tac(u32);

impl Tac {
    pub const MAX: u32 = 0xFF_FFFF;

    /// Parse a hex TAC (1 to 6 hex characters)
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() || raw.len() > 6 {
            return Err("must be 1 to 6 hex characters".to_string());
        }
        if !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err("must contain only hex characters".to_string());
        }
        let value = u32::from_str_radix(raw, 16)
            .map_err(|_| "must contain only hex characters".to_string())?;
        if value == 0 {
            return Err("must be greater than zero".to_string());
        }
        Ok(Tac(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Tac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x}", self.0)
    }
}

impl Serialize for Tac {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How the gNB network attachment is plugged into the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterfaceMode {
    /// No host interface configured: attach to the `ran-br` bridge
    Bridge,
    /// Attach as a macvlan on the given host interface
    Macvlan { master: String },
}

/// AMF reachability, as published on the `fiveg-n2` relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmfEndpoint {
    pub hostname: String,
    pub ip_address: Option<IpAddr>,
    pub port: u16,
}

// ============================================================================
// Canonical Settings
// ============================================================================

/// Validated settings for one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalSettings {
    pub gnb_address: IpNetwork,
    pub interface: InterfaceMode,
    pub icmp_packet_destination: IpAddr,
    pub imsi: Imsi,
    pub subscriber_count: u32,
    pub usim_key: UsimKey,
    pub usim_opc: UsimKey,
    pub usim_sequence_number: SequenceNumber,
    pub plmn: Plmn,
    pub slice: Slice,
    pub tac: Tac,
    pub upf_subnet: IpNetwork,
    pub upf_gateway: IpAddr,
    pub dnn: String,
    pub amf: AmfEndpoint,
}

impl CanonicalSettings {
    /// gNB address without its prefix length
    pub fn gnb_ip(&self) -> IpAddr {
        self.gnb_address.ip()
    }

    /// Every simulated subscriber IMSI, in order
    ///
    /// The range was checked during validation, so no value is skipped.
    pub fn subscriber_imsis(&self) -> impl Iterator<Item = Imsi> + '_ {
        (0..u64::from(self.subscriber_count)).filter_map(|offset| self.imsi.checked_offset(offset))
    }
}
