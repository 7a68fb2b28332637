//! Type conversion utilities for FFI boundary
//!
//! Converts between charm-side dicts and the core's typed inputs.

use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::net::IpAddr;

use crate::config::options::*;
use crate::config::{CharmOptions, ValidationError};
use crate::reconcile::{CharmSnapshot, ReconcilePlan, UnitContext};
use crate::relations::{RelationData, RelationSnapshot};
use crate::render::RenderedConfig;
use crate::workload::WorkloadStatus;

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a required field, with the field name in the error
fn extract_required<T>(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<T>
where
    T: for<'py> FromPyObject<'py>,
{
    dict.get_item(key)?
        .ok_or_else(|| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "Missing required field '{}'",
                key
            ))
        })?
        .extract()
}

/// Extract an optional field; `None` when missing or set to `None`
fn extract_optional<T>(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<Option<T>>
where
    T: for<'py> FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) if !value.is_none() => Ok(Some(value.extract()?)),
        _ => Ok(None),
    }
}

fn extract_with_default<T>(dict: &Bound<'_, PyDict>, key: &str, default: T) -> PyResult<T>
where
    T: for<'py> FromPyObject<'py>,
{
    Ok(extract_optional(dict, key)?.unwrap_or(default))
}

fn value_error(message: String) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(message)
}

// ========================================================================
// Inputs
// ========================================================================

/// Parse charm options keyed by their kebab-case option names
pub fn parse_options(dict: &Bound<'_, PyDict>) -> PyResult<CharmOptions> {
    Ok(CharmOptions {
        gnb_ip_address: extract_with_default(dict, "gnb-ip-address", DEFAULT_GNB_IP_ADDRESS.to_string())?,
        gnb_interface: extract_optional(dict, "gnb-interface")?,
        icmp_packet_destination: extract_with_default(
            dict,
            "icmp-packet-destination",
            DEFAULT_ICMP_PACKET_DESTINATION.to_string(),
        )?,
        imsi: extract_with_default(dict, "imsi", DEFAULT_IMSI.to_string())?,
        usim_key: extract_with_default(dict, "usim-key", DEFAULT_USIM_KEY.to_string())?,
        usim_opc: extract_with_default(dict, "usim-opc", DEFAULT_USIM_OPC.to_string())?,
        usim_sequence_number: extract_with_default(
            dict,
            "usim-sequence-number",
            DEFAULT_USIM_SEQUENCE_NUMBER.to_string(),
        )?,
        mcc: extract_with_default(dict, "mcc", DEFAULT_MCC.to_string())?,
        mnc: extract_with_default(dict, "mnc", DEFAULT_MNC.to_string())?,
        sst: extract_with_default(dict, "sst", DEFAULT_SST)?,
        sd: extract_with_default(dict, "sd", DEFAULT_SD.to_string())?,
        tac: extract_with_default(dict, "tac", DEFAULT_TAC.to_string())?,
        upf_subnet: extract_with_default(dict, "upf-subnet", DEFAULT_UPF_SUBNET.to_string())?,
        upf_gateway: extract_with_default(dict, "upf-gateway", DEFAULT_UPF_GATEWAY.to_string())?,
        dnn: extract_with_default(dict, "dnn", DEFAULT_DNN.to_string())?,
        subscriber_count: extract_with_default(dict, "subscriber-count", DEFAULT_SUBSCRIBER_COUNT)?,
    })
}

/// Parse the relation snapshot
///
/// Expected keys:
/// - `n2`: remote app data of `fiveg-n2`, or `None` without the relation
/// - `gnb_identity_relation_ids`: list of `fiveg_gnb_identity` relation ids
pub fn parse_relations(dict: &Bound<'_, PyDict>) -> PyResult<RelationSnapshot> {
    Ok(RelationSnapshot {
        n2: extract_optional::<RelationData>(dict, "n2")?,
        gnb_identity_relation_ids: extract_with_default(dict, "gnb_identity_relation_ids", Vec::new())?,
    })
}

pub fn parse_unit(dict: &Bound<'_, PyDict>) -> PyResult<UnitContext> {
    Ok(UnitContext {
        model_name: extract_required(dict, "model_name")?,
        app_name: extract_required(dict, "app_name")?,
        is_leader: extract_with_default(dict, "is_leader", false)?,
    })
}

/// Parse `{"options": {...}, "relations": {...}, "unit": {...}}`
pub fn parse_snapshot(dict: &Bound<'_, PyDict>) -> PyResult<CharmSnapshot> {
    let options = match dict.get_item("options")? {
        Some(py_options) if !py_options.is_none() => parse_options(&py_options.downcast_into::<PyDict>()?)?,
        _ => CharmOptions::default(),
    };
    let relations = match dict.get_item("relations")? {
        Some(py_relations) if !py_relations.is_none() => {
            parse_relations(&py_relations.downcast_into::<PyDict>()?)?
        }
        _ => RelationSnapshot::default(),
    };
    let py_unit: Bound<'_, PyDict> = dict
        .get_item("unit")?
        .ok_or_else(|| value_error("Missing required field 'unit'".to_string()))?
        .downcast_into()?;

    Ok(CharmSnapshot {
        options,
        relations,
        unit: parse_unit(&py_unit)?,
    })
}

pub fn parse_workload_status(dict: &Bound<'_, PyDict>) -> PyResult<WorkloadStatus> {
    let address = extract_optional::<String>(dict, "address")?
        .map(|raw| {
            raw.parse::<IpAddr>()
                .map_err(|e| value_error(format!("Invalid workload address '{}': {}", raw, e)))
        })
        .transpose()?;

    Ok(WorkloadStatus {
        can_connect: extract_with_default(dict, "can_connect", false)?,
        storage_attached: extract_with_default(dict, "storage_attached", false)?,
        network_ready: extract_with_default(dict, "network_ready", false)?,
        service_running: extract_with_default(dict, "service_running", false)?,
        address,
    })
}

// ========================================================================
// Results
// ========================================================================

pub fn rendered_to_py(py: Python, rendered: &RenderedConfig) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("content", &rendered.content)?;
    dict.set_item("fingerprint", rendered.fingerprint.as_str())?;
    Ok(dict.into())
}

pub fn validation_errors_to_py(py: Python, errors: &[ValidationError]) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);
    for error in errors {
        dict.set_item(&error.field, &error.reason)?;
    }
    Ok(dict.into())
}

/// Effects and the next applied-state record travel as JSON strings; the
/// charm stores the record verbatim and dispatches on each effect's `type`.
pub fn plan_to_py(py: Python, plan: &ReconcilePlan) -> PyResult<Py<PyDict>> {
    let status = plan.status();
    let to_json = |e: serde_json::Error| {
        PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("Failed to serialize plan: {}", e))
    };

    let dict = PyDict::new(py);
    dict.set_item("status", status.name())?;
    dict.set_item("message", status.message())?;
    dict.set_item("phase", plan.phase.to_string())?;
    dict.set_item("effects", serde_json::to_string(&plan.effects).map_err(to_json)?)?;
    dict.set_item(
        "next_applied",
        serde_json::to_string(&plan.next_applied).map_err(to_json)?,
    )?;
    Ok(dict.into())
}
