// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — JSON Line Orchestrator Client
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! [`OrchestratorClient`] over [`LineChannel`] framing (TCP in production).
//!
//! Outbound request types: `connect`, `initialize_analysis`, `do_time_step`,
//! `current_time_step`, `do_iteration`, `update_inputs`, `update_outputs`,
//! `fatal_error`, `disconnect`.
//!
//! Inbound request types: `get_point_cloud`, `get_output_scalar`,
//! `set_input_scalar`, `get_restart_point`.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use cosim_types::error::{CouplingError, CouplingResult};
use cosim_types::state::{ParticipantInfo, TimeStep, TransferStatus};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::orchestrator::{OrchestratorClient, ParticipantAccessors};
use crate::wire::{reject_requests, LineChannel, WireRequest};

#[derive(Debug, Deserialize)]
struct RegionArgs {
    region: String,
}

#[derive(Debug, Deserialize)]
struct ScalarArgs {
    region: String,
    field: String,
}

#[derive(Debug, Deserialize)]
struct InputArgs {
    region: String,
    field: String,
    values: Vec<f64>,
}

fn args<T: DeserializeOwned>(req: &WireRequest) -> CouplingResult<T> {
    serde_json::from_value(req.payload.clone()).map_err(|e| {
        CouplingError::OrchestratorProtocol(format!("bad '{}' arguments: {e}", req.kind))
    })
}

/// Route one inbound accessor request to the participant.
pub fn dispatch_accessor(
    accessors: &mut dyn ParticipantAccessors,
    req: &WireRequest,
) -> CouplingResult<Value> {
    debug!(request = %req.kind, id = req.id, "accessor call");
    match req.kind.as_str() {
        "get_point_cloud" => {
            let a: RegionArgs = args(req)?;
            Ok(serde_json::to_value(accessors.point_cloud(&a.region)?)?)
        }
        "get_output_scalar" => {
            let a: ScalarArgs = args(req)?;
            Ok(json!(accessors.output_scalar(&a.region, &a.field)?))
        }
        "set_input_scalar" => {
            let a: InputArgs = args(req)?;
            accessors.set_input_scalar(&a.region, &a.field, &a.values)?;
            Ok(Value::Null)
        }
        "get_restart_point" => Ok(serde_json::to_value(accessors.restart_point()?)?),
        other => Err(CouplingError::OrchestratorProtocol(format!(
            "unknown accessor request '{other}'"
        ))),
    }
}

pub struct JsonLineOrchestrator<R, W> {
    channel: LineChannel<R, W>,
}

impl JsonLineOrchestrator<BufReader<TcpStream>, TcpStream> {
    /// Open the TCP link. Connection failures are handshake failures.
    pub fn connect_tcp(host: &str, port: u16) -> CouplingResult<Self> {
        let stream = TcpStream::connect((host, port))
            .map_err(|e| CouplingError::Handshake(format!("{host}:{port}: {e}")))?;
        stream
            .set_nodelay(true)
            .map_err(|e| CouplingError::Handshake(e.to_string()))?;
        let reader = stream
            .try_clone()
            .map_err(|e| CouplingError::Handshake(e.to_string()))?;
        info!(host, port, "orchestrator link open");
        Ok(Self::new(BufReader::new(reader), stream))
    }
}

impl<R: BufRead, W: Write> JsonLineOrchestrator<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        JsonLineOrchestrator {
            channel: LineChannel::new(reader, writer),
        }
    }

    pub fn into_parts(self) -> (R, W) {
        self.channel.into_parts()
    }

    fn call_with(
        &mut self,
        kind: &str,
        payload: Value,
        accessors: &mut dyn ParticipantAccessors,
    ) -> CouplingResult<Value> {
        self.channel
            .call(kind, payload, |req| dispatch_accessor(&mut *accessors, req))?
            .map_err(|msg| CouplingError::OrchestratorProtocol(format!("'{kind}' refused: {msg}")))
    }

    fn call_plain(&mut self, kind: &str, payload: Value) -> CouplingResult<Value> {
        self.channel
            .call(kind, payload, reject_requests)?
            .map_err(|msg| CouplingError::OrchestratorProtocol(format!("'{kind}' refused: {msg}")))
    }

    fn expect_bool(kind: &str, value: Value) -> CouplingResult<bool> {
        value.as_bool().ok_or_else(|| {
            CouplingError::OrchestratorProtocol(format!("'{kind}' returned {value}, expected bool"))
        })
    }
}

impl<R: BufRead, W: Write> OrchestratorClient for JsonLineOrchestrator<R, W> {
    fn connect(&mut self, info: &ParticipantInfo) -> CouplingResult<()> {
        let payload = serde_json::to_value(info)?;
        match self.channel.call("connect", payload, reject_requests) {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(msg)) => Err(CouplingError::Handshake(msg)),
            Err(e) => Err(CouplingError::Handshake(e.to_string())),
        }
    }

    fn initialize_analysis(
        &mut self,
        accessors: &mut dyn ParticipantAccessors,
    ) -> CouplingResult<()> {
        self.call_with("initialize_analysis", Value::Null, accessors)
            .map(|_| ())
    }

    fn has_more_time_steps(
        &mut self,
        accessors: &mut dyn ParticipantAccessors,
    ) -> CouplingResult<bool> {
        let value = self.call_with("do_time_step", Value::Null, accessors)?;
        Self::expect_bool("do_time_step", value)
    }

    fn current_time_step(&mut self) -> CouplingResult<TimeStep> {
        let value = self.call_plain("current_time_step", Value::Null)?;
        serde_json::from_value(value).map_err(|e| {
            CouplingError::OrchestratorProtocol(format!("bad time step payload: {e}"))
        })
    }

    fn has_more_iterations(
        &mut self,
        accessors: &mut dyn ParticipantAccessors,
    ) -> CouplingResult<bool> {
        let value = self.call_with("do_iteration", Value::Null, accessors)?;
        Self::expect_bool("do_iteration", value)
    }

    fn update_inputs(&mut self, accessors: &mut dyn ParticipantAccessors) -> CouplingResult<()> {
        self.call_with("update_inputs", Value::Null, accessors)
            .map(|_| ())
    }

    fn update_outputs(
        &mut self,
        accessors: &mut dyn ParticipantAccessors,
        status: TransferStatus,
    ) -> CouplingResult<()> {
        self.call_with("update_outputs", json!({ "status": status }), accessors)
            .map(|_| ())
    }

    fn report_fatal(&mut self, message: &str) -> CouplingResult<()> {
        self.call_plain("fatal_error", json!({ "message": message }))
            .map(|_| ())
    }

    fn disconnect(&mut self) -> CouplingResult<()> {
        self.call_plain("disconnect", Value::Null).map(|_| ())
    }
}
