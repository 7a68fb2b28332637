//! Tests for config and network attachment rendering
//!
//! Rendering must be a pure function of the settings: equal settings give
//! byte-identical output, so the fingerprint alone decides whether the
//! workload needs a rewrite and restart.

use gnbsim_operator_core_rs::config::CanonicalSettings;
use gnbsim_operator_core_rs::{
    render, render_network_attachment, validate, CharmOptions, RelationData, RelationSnapshot,
};
use proptest::prelude::*;
use serde_yaml::Value;

fn relations() -> RelationSnapshot {
    let mut n2 = RelationData::new();
    n2.insert("amf_hostname".to_string(), "amf".to_string());
    n2.insert("amf_port".to_string(), "38412".to_string());
    RelationSnapshot {
        n2: Some(n2),
        gnb_identity_relation_ids: vec![],
    }
}

fn settings(options: &CharmOptions) -> CanonicalSettings {
    validate(options, &relations()).unwrap()
}

fn parse(content: &str) -> Value {
    serde_yaml::from_str(content).unwrap()
}

fn subscriber_imsis(document: &Value) -> Vec<String> {
    document["configuration"]["subscribers"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|s| s["imsi"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_render_default_document() {
    let rendered = render(&settings(&CharmOptions::default())).unwrap();
    let document = parse(&rendered.content);

    let gnb = &document["configuration"]["gnbs"]["gnb1"];
    assert_eq!(gnb["n2IpAddr"].as_str(), Some("192.168.251.5"));
    assert_eq!(gnb["n3IpAddr"].as_str(), Some("192.168.251.5"));
    assert_eq!(gnb["defaultAmf"]["hostName"].as_str(), Some("amf"));
    assert_eq!(gnb["defaultAmf"]["port"].as_u64(), Some(38412));
    assert!(gnb["defaultAmf"].get("ipAddr").is_none());
    assert_eq!(gnb["supportedTaList"][0]["tac"].as_str(), Some("000001"));

    let profiles = document["configuration"]["profiles"].as_sequence().unwrap();
    assert_eq!(profiles.len(), 5);
    for profile in profiles {
        assert_eq!(profile["startImsi"].as_str(), Some("001010100007487"));
        assert_eq!(profile["ueCount"].as_u64(), Some(1));
        assert_eq!(profile["defaultAs"].as_str(), Some("192.168.250.1"));
        assert_eq!(profile["dnn"].as_str(), Some("internet"));
    }

    assert_eq!(subscriber_imsis(&document), vec!["001010100007487"]);
}

#[test]
fn test_fingerprint_tracks_subscriber_count() {
    let one = render(&settings(&CharmOptions::default())).unwrap();
    let three = render(&settings(&CharmOptions {
        subscriber_count: 3,
        ..CharmOptions::default()
    }))
    .unwrap();

    assert_ne!(one.fingerprint, three.fingerprint);
    assert_eq!(
        subscriber_imsis(&parse(&three.content)),
        vec!["001010100007487", "001010100007488", "001010100007489"]
    );
}

#[test]
fn test_amf_ip_rendered_when_published() {
    let mut relations = relations();
    if let Some(n2) = relations.n2.as_mut() {
        n2.insert("amf_ip_address".to_string(), "10.0.0.5".to_string());
    }
    let settings = validate(&CharmOptions::default(), &relations).unwrap();

    let document = parse(&render(&settings).unwrap().content);

    assert_eq!(
        document["configuration"]["gnbs"]["gnb1"]["defaultAmf"]["ipAddr"].as_str(),
        Some("10.0.0.5")
    );
}

#[test]
fn test_bridge_attachment_by_default() {
    let attachment = render_network_attachment(&settings(&CharmOptions::default())).unwrap();
    let config: serde_json::Value = serde_json::from_str(&attachment.config).unwrap();

    assert_eq!(attachment.name, "gnb-net");
    assert_eq!(attachment.interface, "gnb");
    assert_eq!(config["type"], "bridge");
    assert_eq!(config["bridge"], "ran-br");
    assert_eq!(config["ipam"]["type"], "static");
    assert_eq!(config["ipam"]["addresses"][0]["address"], "192.168.251.5/24");
    assert_eq!(config["capabilities"]["mac"], true);
}

#[test]
fn test_macvlan_attachment_with_interface() {
    let bridge = render_network_attachment(&settings(&CharmOptions::default())).unwrap();
    let macvlan = render_network_attachment(&settings(&CharmOptions {
        gnb_interface: Some("enp0s8".to_string()),
        ..CharmOptions::default()
    }))
    .unwrap();
    let config: serde_json::Value = serde_json::from_str(&macvlan.config).unwrap();

    assert_eq!(config["type"], "macvlan");
    assert_eq!(config["master"], "enp0s8");
    assert!(config.get("bridge").is_none());
    assert_ne!(bridge.fingerprint, macvlan.fingerprint);
}

proptest! {
    /// Equal settings always render byte-identical content
    #[test]
    fn prop_render_is_deterministic(count in 1i64..50, sst in 0i64..256) {
        let options = CharmOptions {
            subscriber_count: count,
            sst,
            ..CharmOptions::default()
        };

        let first = render(&settings(&options)).unwrap();
        let second = render(&settings(&options.clone())).unwrap();

        prop_assert_eq!(&first.content, &second.content);
        prop_assert_eq!(first.fingerprint, second.fingerprint);
    }

    /// n subscribers starting at I render exactly I..I+n-1, 15 digits each
    #[test]
    fn prop_subscribers_enumerate_from_base(base in 0u64..999_999_999_000_000, count in 1u32..40) {
        let options = CharmOptions {
            imsi: format!("{:015}", base),
            subscriber_count: i64::from(count),
            ..CharmOptions::default()
        };

        let imsis = subscriber_imsis(&parse(&render(&settings(&options)).unwrap().content));

        prop_assert_eq!(imsis.len(), count as usize);
        for (offset, imsi) in imsis.iter().enumerate() {
            prop_assert_eq!(imsi.len(), 15);
            prop_assert_eq!(imsi.parse::<u64>().unwrap(), base + offset as u64);
        }
    }
}
