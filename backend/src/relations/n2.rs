//! `fiveg-n2` relation: AMF reachability data

use crate::config::{AmfEndpoint, ValidationError};
use crate::relations::RelationData;
use std::net::IpAddr;

pub const N2_RELATION_NAME: &str = "fiveg-n2";

pub const AMF_HOSTNAME_KEY: &str = "amf_hostname";
pub const AMF_PORT_KEY: &str = "amf_port";
pub const AMF_IP_ADDRESS_KEY: &str = "amf_ip_address";

/// Parse the AMF's application data bag
///
/// Returns `Ok(None)` while the AMF has not published its hostname and port
/// yet. Present but malformed values are reported per key.
pub fn parse_n2_data(data: &RelationData) -> Result<Option<AmfEndpoint>, Vec<ValidationError>> {
    let hostname = data.get(AMF_HOSTNAME_KEY).map(|s| s.trim()).filter(|s| !s.is_empty());
    let port = data.get(AMF_PORT_KEY).map(|s| s.trim()).filter(|s| !s.is_empty());

    let (Some(hostname), Some(port)) = (hostname, port) else {
        return Ok(None);
    };

    let mut errors = Vec::new();

    if hostname.chars().any(char::is_whitespace) {
        errors.push(ValidationError::new(AMF_HOSTNAME_KEY, "must not contain whitespace"));
    }

    let port = match port.parse::<u16>() {
        Ok(0) | Err(_) => {
            errors.push(ValidationError::new(
                AMF_PORT_KEY,
                format!("'{}' is not a valid port (1-65535)", port),
            ));
            None
        }
        Ok(port) => Some(port),
    };

    let ip_address = match data.get(AMF_IP_ADDRESS_KEY).map(|s| s.trim()) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                errors.push(ValidationError::new(
                    AMF_IP_ADDRESS_KEY,
                    format!("'{}' is not a valid IP address", raw),
                ));
                None
            }
        },
    };

    match port {
        Some(port) if errors.is_empty() => Ok(Some(AmfEndpoint {
            hostname: hostname.to_string(),
            ip_address,
            port,
        })),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(&str, &str)]) -> RelationData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_complete_data_is_parsed() {
        let data = bag(&[
            ("amf_hostname", "amf"),
            ("amf_port", "38412"),
            ("amf_ip_address", "192.168.70.132"),
        ]);

        let amf = parse_n2_data(&data).unwrap().unwrap();
        assert_eq!(amf.hostname, "amf");
        assert_eq!(amf.port, 38412);
        assert_eq!(amf.ip_address, Some("192.168.70.132".parse().unwrap()));
    }

    #[test]
    fn test_missing_port_is_pending() {
        let data = bag(&[("amf_hostname", "amf")]);
        assert_eq!(parse_n2_data(&data), Ok(None));
        assert_eq!(parse_n2_data(&RelationData::new()), Ok(None));
    }

    #[test]
    fn test_bad_port_and_ip_are_reported_together() {
        let data = bag(&[
            ("amf_hostname", "amf"),
            ("amf_port", "70000"),
            ("amf_ip_address", "not-an-ip"),
        ]);

        let errors = parse_n2_data(&data).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["amf_port", "amf_ip_address"]);
    }
}
