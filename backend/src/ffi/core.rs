//! PyO3 wrapper for the reconcile core
//!
//! Stateless: every call takes the full snapshot, so the charm stays the
//! owner of the applied-state record and of every side effect.

use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::{
    parse_options, parse_snapshot, parse_workload_status, plan_to_py,
    rendered_to_py, validation_errors_to_py,
};
use crate::config;
use crate::reconcile::{engine, AppliedState, ReconcileInputs};
use crate::relations::{RelationData, RelationSnapshot};
use crate::render;

/// Python entry point to the gnbsim operator core
///
/// # Example (from Python)
///
/// ```python
/// from gnbsim_operator_core_rs import GnbsimCore
///
/// plan = GnbsimCore.plan(
///     {"options": dict(self.config), "relations": relations, "unit": unit},
///     {"can_connect": True, "storage_attached": True, "network_ready": True},
///     stored_state.applied,
/// )
/// stored_state.applied = plan["next_applied"]
/// ```
#[pyclass(name = "GnbsimCore")]
pub struct PyGnbsimCore;

#[pymethods]
impl PyGnbsimCore {
    /// Validate options and N2 data
    ///
    /// Returns a dict of `field -> reason`; empty when the config is valid.
    ///
    /// # Errors
    ///
    /// Raises ValueError for a missing integration or pending relation data,
    /// which have no field to blame.
    #[staticmethod]
    #[pyo3(signature = (options, n2=None))]
    fn validate(
        py: Python,
        options: &Bound<'_, PyDict>,
        n2: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyDict>> {
        let options = parse_options(options)?;
        let relations = relations_with_n2(n2)?;

        match config::validate(&options, &relations) {
            Ok(_) => Ok(PyDict::new(py).into()),
            Err(err) if !err.field_errors().is_empty() => {
                validation_errors_to_py(py, err.field_errors())
            }
            Err(err) => Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(err.to_string())),
        }
    }

    /// Render the gnbsim config file
    ///
    /// Returns `{"content": str, "fingerprint": str}`.
    #[staticmethod]
    #[pyo3(signature = (options, n2=None))]
    fn render(
        py: Python,
        options: &Bound<'_, PyDict>,
        n2: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyDict>> {
        let options = parse_options(options)?;
        let relations = relations_with_n2(n2)?;

        let settings = config::validate(&options, &relations)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
        let rendered = render::render(&settings)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))?;

        rendered_to_py(py, &rendered)
    }

    /// Plan one reconciliation pass
    ///
    /// # Arguments
    ///
    /// * `snapshot` - `{"options", "relations", "unit"}`
    /// * `workload` - observed workload state
    /// * `applied` - JSON record returned as `next_applied` by the previous
    ///   pass, or `None` on the first one
    ///
    /// # Returns
    ///
    /// `{"status", "message", "phase", "effects", "next_applied"}`, with
    /// `effects` and `next_applied` as JSON strings.
    #[staticmethod]
    #[pyo3(signature = (snapshot, workload, applied=None))]
    fn plan(
        py: Python,
        snapshot: &Bound<'_, PyDict>,
        workload: &Bound<'_, PyDict>,
        applied: Option<&str>,
    ) -> PyResult<Py<PyDict>> {
        let charm = parse_snapshot(snapshot)?;
        let workload = parse_workload_status(workload)?;
        let applied: AppliedState = match applied {
            Some(raw) => serde_json::from_str(raw).map_err(|e| {
                PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                    "Invalid applied state: {}",
                    e
                ))
            })?,
            None => AppliedState::default(),
        };

        let plan = engine::plan(&ReconcileInputs::new(charm, workload), &applied)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))?;

        plan_to_py(py, &plan)
    }
}

fn relations_with_n2(n2: Option<&Bound<'_, PyDict>>) -> PyResult<RelationSnapshot> {
    Ok(RelationSnapshot {
        n2: n2.map(|dict| dict.extract::<RelationData>()).transpose()?,
        ..RelationSnapshot::default()
    })
}
