//! Config validation - raw options and relation data into [`CanonicalSettings`]
//!
//! Static options are checked first and every bad field is reported at once,
//! so the operator can fix them in one go. Relation checks only run once the
//! options are valid.

use crate::config::options::CharmOptions;
use crate::config::settings::{
    AmfEndpoint, CanonicalSettings, Imsi, InterfaceMode, Plmn, SequenceNumber, Slice,
    SliceDifferentiator, Tac, UsimKey,
};
use crate::relations::n2::{parse_n2_data, N2_RELATION_NAME};
use crate::relations::RelationSnapshot;
use ipnetwork::IpNetwork;
use std::net::IpAddr;
use thiserror::Error;

/// Longest accepted data network name
pub const MAX_DNN_LENGTH: usize = 100;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Why a pass could not produce [`CanonicalSettings`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigModelError {
    #[error("Configurations are invalid: [{}]", field_list(.0))]
    InvalidOptions(Vec<ValidationError>),

    #[error("Missing required integration: {0}")]
    MissingIntegration(&'static str),

    #[error("Waiting for N2 information")]
    RelationDataPending(&'static str),

    #[error("Invalid {relation} relation data: [{}]", field_list(.errors))]
    InvalidRelationData {
        relation: &'static str,
        errors: Vec<ValidationError>,
    },
}

impl ConfigModelError {
    /// Blocking errors need operator action; the rest clear up on their own
    pub fn is_blocking(&self) -> bool {
        !matches!(self, ConfigModelError::RelationDataPending(_))
    }

    /// Every field-level error carried by this error
    pub fn field_errors(&self) -> &[ValidationError] {
        match self {
            ConfigModelError::InvalidOptions(errors)
            | ConfigModelError::InvalidRelationData { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn field_list(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("'{}'", e.field))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Field collector
// ============================================================================

struct FieldCollector {
    errors: Vec<ValidationError>,
}

impl FieldCollector {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(reason) => {
                self.errors.push(ValidationError::new(field, reason));
                None
            }
        }
    }
}

fn non_empty(raw: &str) -> Result<&str, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(trimmed)
    }
}

fn parse_cidr(raw: &str) -> Result<IpNetwork, String> {
    let raw = non_empty(raw)?;
    if !raw.contains('/') {
        return Err(format!("'{}' is not in CIDR notation", raw));
    }
    raw.parse::<IpNetwork>()
        .map_err(|_| format!("'{}' is not a valid CIDR", raw))
}

fn parse_ip(raw: &str) -> Result<IpAddr, String> {
    let raw = non_empty(raw)?;
    raw.parse::<IpAddr>()
        .map_err(|_| format!("'{}' is not a valid IP address", raw))
}

fn parse_digits(raw: &str, lengths: &[usize]) -> Result<String, String> {
    let raw = non_empty(raw)?;
    if !lengths.contains(&raw.len()) || !raw.bytes().all(|b| b.is_ascii_digit()) {
        let expected = lengths
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        return Err(format!("must be {} digits", expected));
    }
    Ok(raw.to_string())
}

fn parse_sst(raw: i64) -> Result<u8, String> {
    u8::try_from(raw).map_err(|_| format!("{} is out of range (0-255)", raw))
}

fn parse_subscriber_count(raw: i64) -> Result<u32, String> {
    if raw < 1 {
        return Err(format!("must be at least 1, got {}", raw));
    }
    u32::try_from(raw).map_err(|_| format!("{} is too large", raw))
}

fn parse_dnn(raw: &str) -> Result<String, String> {
    let raw = non_empty(raw)?;
    if raw.len() > MAX_DNN_LENGTH {
        return Err(format!("must be at most {} characters", MAX_DNN_LENGTH));
    }
    let mut chars = raw.chars();
    let starts_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if !(starts_ok && rest_ok) {
        return Err(format!("'{}' is not a valid data network name", raw));
    }
    Ok(raw.to_string())
}

fn parse_interface(raw: Option<&str>) -> Result<InterfaceMode, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(InterfaceMode::Bridge),
        Some(name) if name.chars().any(char::is_whitespace) => {
            Err(format!("'{}' is not a valid interface name", name))
        }
        Some(name) => Ok(InterfaceMode::Macvlan {
            master: name.to_string(),
        }),
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validate options and relation data into canonical settings
///
/// # Errors
///
/// - [`ConfigModelError::InvalidOptions`] listing every malformed option
/// - [`ConfigModelError::MissingIntegration`] when `fiveg-n2` does not exist
/// - [`ConfigModelError::RelationDataPending`] when the AMF has not published yet
/// - [`ConfigModelError::InvalidRelationData`] when the AMF data is malformed
pub fn validate(
    options: &CharmOptions,
    relations: &RelationSnapshot,
) -> Result<CanonicalSettings, ConfigModelError> {
    let mut fields = FieldCollector::new();

    let gnb_address = fields.check("gnb-ip-address", parse_cidr(&options.gnb_ip_address));
    let interface = fields.check("gnb-interface", parse_interface(options.gnb_interface.as_deref()));
    let icmp_packet_destination = fields.check(
        "icmp-packet-destination",
        parse_ip(&options.icmp_packet_destination),
    );
    let imsi = fields.check("imsi", non_empty(&options.imsi).and_then(Imsi::parse));
    let usim_key = fields.check("usim-key", non_empty(&options.usim_key).and_then(UsimKey::parse));
    let usim_opc = fields.check("usim-opc", non_empty(&options.usim_opc).and_then(UsimKey::parse));
    let usim_sequence_number = fields.check(
        "usim-sequence-number",
        non_empty(&options.usim_sequence_number).and_then(SequenceNumber::parse),
    );
    let mcc = fields.check("mcc", parse_digits(&options.mcc, &[3]));
    let mnc = fields.check("mnc", parse_digits(&options.mnc, &[2, 3]));
    let sst = fields.check("sst", parse_sst(options.sst));
    let sd = fields.check("sd", non_empty(&options.sd).and_then(SliceDifferentiator::parse));
    let tac = fields.check("tac", non_empty(&options.tac).and_then(Tac::parse));
    let upf_subnet = fields.check("upf-subnet", parse_cidr(&options.upf_subnet));
    let upf_gateway = fields.check("upf-gateway", parse_ip(&options.upf_gateway));
    let dnn = fields.check("dnn", parse_dnn(&options.dnn));
    let subscriber_count = fields.check(
        "subscriber-count",
        parse_subscriber_count(options.subscriber_count),
    );

    if let (Some(imsi), Some(count)) = (imsi, subscriber_count) {
        if imsi.checked_offset(u64::from(count) - 1).is_none() {
            fields.errors.push(ValidationError::new(
                "subscriber-count",
                format!(
                    "{} subscribers starting at {} overflow the {}-digit IMSI range",
                    count,
                    imsi,
                    Imsi::DIGITS
                ),
            ));
        }
    }

    let (
        Some(gnb_address),
        Some(interface),
        Some(icmp_packet_destination),
        Some(imsi),
        Some(usim_key),
        Some(usim_opc),
        Some(usim_sequence_number),
        Some(mcc),
        Some(mnc),
        Some(sst),
        Some(sd),
        Some(tac),
        Some(upf_subnet),
        Some(upf_gateway),
        Some(dnn),
        Some(subscriber_count),
    ) = (
        gnb_address,
        interface,
        icmp_packet_destination,
        imsi,
        usim_key,
        usim_opc,
        usim_sequence_number,
        mcc,
        mnc,
        sst,
        sd,
        tac,
        upf_subnet,
        upf_gateway,
        dnn,
        subscriber_count,
    )
    else {
        return Err(ConfigModelError::InvalidOptions(fields.errors));
    };

    if !fields.errors.is_empty() {
        return Err(ConfigModelError::InvalidOptions(fields.errors));
    }

    let amf = resolve_amf(relations)?;

    Ok(CanonicalSettings {
        gnb_address,
        interface,
        icmp_packet_destination,
        imsi,
        subscriber_count,
        usim_key,
        usim_opc,
        usim_sequence_number,
        plmn: Plmn { mcc, mnc },
        slice: Slice { sst, sd },
        tac,
        upf_subnet,
        upf_gateway,
        dnn,
        amf,
    })
}

fn resolve_amf(relations: &RelationSnapshot) -> Result<AmfEndpoint, ConfigModelError> {
    let data = relations
        .n2
        .as_ref()
        .ok_or(ConfigModelError::MissingIntegration(N2_RELATION_NAME))?;

    match parse_n2_data(data) {
        Ok(Some(amf)) => Ok(amf),
        Ok(None) => Err(ConfigModelError::RelationDataPending(N2_RELATION_NAME)),
        Err(errors) => Err(ConfigModelError::InvalidRelationData {
            relation: N2_RELATION_NAME,
            errors,
        }),
    }
}
