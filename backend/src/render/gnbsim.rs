//! Typed layout of the gnbsim configuration file
//!
//! Field order in these structs is the field order on disk. Maps are
//! `BTreeMap`s so iteration order never depends on hashing.

use crate::config::{CanonicalSettings, Imsi};
use serde::Serialize;
use std::collections::BTreeMap;

/// Name of the single simulated gNB inside the config file
pub const GNB_NAME: &str = "gnb1";

pub const N2_PORT: u16 = 9487;
pub const N3_PORT: u16 = 2152;
pub const GNB_ID_BIT_LENGTH: u8 = 24;
pub const GNB_ID_VALUE: &str = "000102";

/// Profiles run by a full simulation, in execution order
pub const PROFILE_TYPES: [&str; 5] = [
    "register",
    "pdusessest",
    "deregister",
    "anrelease",
    "uetriggservicereq",
];

#[derive(Debug, Serialize)]
pub struct GnbsimDocument {
    pub info: Info,
    pub configuration: Configuration,
    pub logger: Logger,
}

#[derive(Debug, Serialize)]
pub struct Info {
    pub version: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub run_config_profiles_at_start: bool,
    pub single_interface: bool,
    pub exec_in_parallel: bool,
    pub http_server: HttpServer,
    pub gnbs: BTreeMap<String, Gnb>,
    pub profiles: Vec<Profile>,
    pub subscribers: Vec<Subscriber>,
}

#[derive(Debug, Serialize)]
pub struct HttpServer {
    pub enable: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gnb {
    pub n2_ip_addr: String,
    pub n2_port: u16,
    pub n3_ip_addr: String,
    pub n3_port: u16,
    pub name: String,
    pub global_ran_id: GlobalRanId,
    pub supported_ta_list: Vec<SupportedTa>,
    pub default_amf: DefaultAmf,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlmnId {
    pub mcc: String,
    pub mnc: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRanId {
    pub plmn_id: PlmnId,
    pub gnb_id: GnbId,
}

#[derive(Debug, Serialize)]
pub struct GnbId {
    #[serde(rename = "bitLength")]
    pub bit_length: u8,
    #[serde(rename = "gNBValue")]
    pub gnb_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedTa {
    pub tac: String,
    pub broadcast_plmn_list: Vec<BroadcastPlmn>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastPlmn {
    pub plmn_id: PlmnId,
    pub tai_slice_support_list: Vec<SNssai>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SNssai {
    pub sst: u8,
    pub sd: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultAmf {
    pub host_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_addr: Option<String>,
    pub port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub profile_type: String,
    pub profile_name: String,
    pub enable: bool,
    pub gnb_name: String,
    pub start_imsi: String,
    pub ue_count: u32,
    pub default_as: String,
    pub opc: String,
    pub key: String,
    pub sequence_number: String,
    pub dnn: String,
    #[serde(rename = "sNssai")]
    pub s_nssai: SNssai,
    pub exec_in_parallel: bool,
    pub plmn_id: PlmnId,
}

/// One simulated subscriber's SIM credentials
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub imsi: String,
    pub key: String,
    pub opc: String,
    pub sequence_number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Logger {
    pub log_level: &'static str,
}

impl GnbsimDocument {
    pub fn from_settings(settings: &CanonicalSettings) -> Self {
        let plmn_id = PlmnId {
            mcc: settings.plmn.mcc.clone(),
            mnc: settings.plmn.mnc.clone(),
        };
        let s_nssai = SNssai {
            sst: settings.slice.sst,
            sd: settings.slice.sd.to_string(),
        };
        let gnb_ip = settings.gnb_ip().to_string();

        let gnb = Gnb {
            n2_ip_addr: gnb_ip.clone(),
            n2_port: N2_PORT,
            n3_ip_addr: gnb_ip,
            n3_port: N3_PORT,
            name: GNB_NAME.to_string(),
            global_ran_id: GlobalRanId {
                plmn_id: plmn_id.clone(),
                gnb_id: GnbId {
                    bit_length: GNB_ID_BIT_LENGTH,
                    gnb_value: GNB_ID_VALUE.to_string(),
                },
            },
            supported_ta_list: vec![SupportedTa {
                tac: settings.tac.to_string(),
                broadcast_plmn_list: vec![BroadcastPlmn {
                    plmn_id: plmn_id.clone(),
                    tai_slice_support_list: vec![s_nssai.clone()],
                }],
            }],
            default_amf: DefaultAmf {
                host_name: settings.amf.hostname.clone(),
                ip_addr: settings.amf.ip_address.map(|ip| ip.to_string()),
                port: settings.amf.port,
            },
        };

        let profiles = PROFILE_TYPES
            .iter()
            .enumerate()
            .map(|(index, profile_type)| Profile {
                profile_type: profile_type.to_string(),
                profile_name: format!("profile{}", index + 1),
                enable: true,
                gnb_name: GNB_NAME.to_string(),
                start_imsi: settings.imsi.to_string(),
                ue_count: settings.subscriber_count,
                default_as: settings.icmp_packet_destination.to_string(),
                opc: settings.usim_opc.to_string(),
                key: settings.usim_key.to_string(),
                sequence_number: settings.usim_sequence_number.to_string(),
                dnn: settings.dnn.clone(),
                s_nssai: s_nssai.clone(),
                exec_in_parallel: false,
                plmn_id: plmn_id.clone(),
            })
            .collect();

        let subscribers = settings
            .subscriber_imsis()
            .map(|imsi: Imsi| Subscriber {
                imsi: imsi.to_string(),
                key: settings.usim_key.to_string(),
                opc: settings.usim_opc.to_string(),
                sequence_number: settings.usim_sequence_number.to_string(),
            })
            .collect();

        let mut gnbs = BTreeMap::new();
        gnbs.insert(GNB_NAME.to_string(), gnb);

        GnbsimDocument {
            info: Info {
                version: "1.0.0",
                description: "gNodeB simulator configuration",
            },
            configuration: Configuration {
                run_config_profiles_at_start: true,
                single_interface: false,
                exec_in_parallel: false,
                http_server: HttpServer { enable: false },
                gnbs,
                profiles,
                subscribers,
            },
            logger: Logger { log_level: "info" },
        }
    }
}
