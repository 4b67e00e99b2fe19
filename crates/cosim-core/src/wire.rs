// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — JSON Line Framing
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Newline-delimited JSON request/response framing.
//!
//! Every frame is one JSON object on one line, tagged by `kind`:
//!
//! ```text
//! {"kind":"request","id":3,"type":"do_iteration","payload":null}
//! {"kind":"response","id":3,"ok":true,"payload":true}
//! ```
//!
//! While a call waits for its response the peer may send requests of its
//! own; those are handed to the caller's handler and answered in line.

use std::io::{BufRead, Write};

use cosim_types::error::{CouplingError, CouplingResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{trace, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResponse {
    pub id: u64,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WireResponse {
    pub fn success(id: u64, payload: Value) -> Self {
        WireResponse {
            id,
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(id: u64, message: impl Into<String>) -> Self {
        WireResponse {
            id,
            ok: false,
            payload: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    Request(WireRequest),
    Response(WireResponse),
}

/// Result reported by the peer: payload on success, its message on failure.
pub type Reply = Result<Value, String>;

pub struct LineChannel<R, W> {
    reader: R,
    writer: W,
    next_id: u64,
    line: String,
}

impl<R: BufRead, W: Write> LineChannel<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        LineChannel {
            reader,
            writer,
            next_id: 1,
            line: String::new(),
        }
    }

    pub fn send(&mut self, frame: &Frame) -> CouplingResult<()> {
        serde_json::to_writer(&mut self.writer, frame)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        trace!(?frame, "frame sent");
        Ok(())
    }

    pub fn recv(&mut self) -> CouplingResult<Frame> {
        loop {
            self.line.clear();
            let n = self.reader.read_line(&mut self.line)?;
            if n == 0 {
                return Err(CouplingError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "peer closed the connection",
                )));
            }
            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            let frame: Frame = serde_json::from_str(text)?;
            trace!(?frame, "frame received");
            return Ok(frame);
        }
    }

    /// Send a request and wait for its response, serving peer requests meanwhile.
    ///
    /// A handler error is answered to the peer and then returned, ending the call.
    pub fn call<F>(&mut self, kind: &str, payload: Value, mut handler: F) -> CouplingResult<Reply>
    where
        F: FnMut(&WireRequest) -> CouplingResult<Value>,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&Frame::Request(WireRequest {
            id,
            kind: kind.to_string(),
            payload,
        }))?;

        loop {
            match self.recv()? {
                Frame::Response(resp) if resp.id == id => {
                    return Ok(if resp.ok {
                        Ok(resp.payload.unwrap_or(Value::Null))
                    } else {
                        Err(resp
                            .error
                            .unwrap_or_else(|| format!("'{kind}' failed without a message")))
                    });
                }
                Frame::Response(resp) => {
                    return Err(CouplingError::OrchestratorProtocol(format!(
                        "response id {} while waiting for {id} ('{kind}')",
                        resp.id
                    )));
                }
                Frame::Request(req) => match handler(&req) {
                    Ok(value) => self.send(&Frame::Response(WireResponse::success(req.id, value)))?,
                    Err(err) => {
                        let answer = WireResponse::failure(req.id, err.to_string());
                        if let Err(send_err) = self.send(&Frame::Response(answer)) {
                            warn!(
                                error = %send_err,
                                id = req.id,
                                "could not answer failed request"
                            );
                        }
                        return Err(err);
                    }
                },
            }
        }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

/// Handler for peers that must never send requests.
pub fn reject_requests(req: &WireRequest) -> CouplingResult<Value> {
    Err(CouplingError::OrchestratorProtocol(format!(
        "unexpected request '{}'",
        req.kind
    )))
}
