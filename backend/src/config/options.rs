//! Raw charm options, exactly as the operator supplies them
//!
//! Values are kept as loosely typed as the orchestration layer delivers them
//! (strings and signed integers) so that every malformed value can be reported
//! by [`validate`](super::validate) instead of failing at deserialization.

use serde::{Deserialize, Serialize};

/// Default values mirror the charm's published `config.yaml`.
pub const DEFAULT_GNB_IP_ADDRESS: &str = "192.168.251.5/24";
pub const DEFAULT_ICMP_PACKET_DESTINATION: &str = "192.168.250.1";
pub const DEFAULT_IMSI: &str = "001010100007487";
pub const DEFAULT_USIM_KEY: &str = "5122250214c33e723a5dd523fc145fc0";
pub const DEFAULT_USIM_OPC: &str = "981d464c7c52eb6e5036234984ad0bcf";
pub const DEFAULT_USIM_SEQUENCE_NUMBER: &str = "16f3b3f70fc2";
pub const DEFAULT_MCC: &str = "001";
pub const DEFAULT_MNC: &str = "01";
pub const DEFAULT_SST: i64 = 1;
pub const DEFAULT_SD: &str = "102030";
pub const DEFAULT_TAC: &str = "0001";
pub const DEFAULT_UPF_SUBNET: &str = "192.168.252.0/24";
pub const DEFAULT_UPF_GATEWAY: &str = "192.168.251.1";
pub const DEFAULT_DNN: &str = "internet";
pub const DEFAULT_SUBSCRIBER_COUNT: i64 = 1;

/// Static charm configuration
///
/// Keys use the charm's kebab-case option names, so a `config.yaml` style
/// document deserializes directly. Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CharmOptions {
    /// gNodeB address on the RAN network, in CIDR notation
    pub gnb_ip_address: String,

    /// Host interface for a macvlan attachment; bridge mode when unset
    pub gnb_interface: Option<String>,

    /// Destination used by the simulated UEs for ICMP traffic
    pub icmp_packet_destination: String,

    /// First subscriber IMSI (15 digits)
    pub imsi: String,

    pub usim_key: String,
    pub usim_opc: String,
    pub usim_sequence_number: String,

    /// Mobile Country Code
    pub mcc: String,

    /// Mobile Network Code
    pub mnc: String,

    /// Slice/Service Type
    pub sst: i64,

    /// Slice Differentiator (hex)
    pub sd: String,

    /// Tracking Area Code (hex)
    pub tac: String,

    pub upf_subnet: String,
    pub upf_gateway: String,

    /// Data network name
    pub dnn: String,

    /// Number of simulated subscribers, starting at `imsi`
    pub subscriber_count: i64,
}

impl Default for CharmOptions {
    fn default() -> Self {
        Self {
            gnb_ip_address: DEFAULT_GNB_IP_ADDRESS.to_string(),
            gnb_interface: None,
            icmp_packet_destination: DEFAULT_ICMP_PACKET_DESTINATION.to_string(),
            imsi: DEFAULT_IMSI.to_string(),
            usim_key: DEFAULT_USIM_KEY.to_string(),
            usim_opc: DEFAULT_USIM_OPC.to_string(),
            usim_sequence_number: DEFAULT_USIM_SEQUENCE_NUMBER.to_string(),
            mcc: DEFAULT_MCC.to_string(),
            mnc: DEFAULT_MNC.to_string(),
            sst: DEFAULT_SST,
            sd: DEFAULT_SD.to_string(),
            tac: DEFAULT_TAC.to_string(),
            upf_subnet: DEFAULT_UPF_SUBNET.to_string(),
            upf_gateway: DEFAULT_UPF_GATEWAY.to_string(),
            dnn: DEFAULT_DNN.to_string(),
            subscriber_count: DEFAULT_SUBSCRIBER_COUNT,
        }
    }
}
