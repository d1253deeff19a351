use prost::Message;
use tracing::{debug, warn};

use crate::error::OlrError;
use crate::framing::{encode_frame, FrameDecoder};
use crate::proto::{redo_request, RedoRequest, RedoResponse, RequestCode, ResponseCode};
use crate::transport::Transport;

/// Replication client for one OpenLogReplicator source. Owns the framing
/// buffer and the in-memory `(scn, c_scn, c_idx)` triple.
pub struct OlrClient<T: Transport> {
    transport: T,
    decoder: FrameDecoder,
    scn: u64,
    c_scn: u64,
    c_idx: u64,
}

impl<T: Transport> OlrClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: FrameDecoder::new(),
            scn: 0,
            c_scn: 0,
            c_idx: 0,
        }
    }

    pub fn scn(&self) -> u64 {
        self.scn
    }

    pub fn c_scn(&self) -> u64 {
        self.c_scn
    }

    pub fn c_idx(&self) -> u64 {
        self.c_idx
    }

    /// Seed the triple from persisted state, e.g. after a restart.
    pub fn init_scns(&mut self, scn: u64, c_scn: u64, c_idx: u64) {
        self.scn = scn;
        self.c_scn = c_scn;
        self.c_idx = c_idx;
    }

    /// Record positions observed in the stream; zeroes never move the
    /// triple backwards.
    pub fn set_scns(&mut self, scn: u64, c_scn: u64, c_idx: u64) {
        if scn > 0 {
            self.scn = scn;
        }
        if c_scn > 0 {
            self.c_scn = c_scn;
        }
        if c_idx > 0 {
            self.c_idx = c_idx;
        }
    }

    /// Begin replication. `START` asks for the stream from scratch;
    /// `CONTINUE` resumes one position past the last known scn pair.
    pub async fn start_or_continue(
        &mut self,
        source: &str,
        start: bool,
    ) -> Result<ResponseCode, OlrError> {
        let request = RedoRequest {
            code: if start {
                RequestCode::Start as i32
            } else {
                RequestCode::Continue as i32
            },
            database_name: source.to_string(),
            tm_val: Some(redo_request::TmVal::Scn(if self.scn == 0 {
                0
            } else {
                self.scn + 1
            })),
            c_scn: if self.c_scn == 0 { 0 } else { self.c_scn + 1 },
            c_idx: 0,
        };
        debug!(
            "requested scn {:?} c_scn {}",
            request.tm_val, request.c_scn
        );
        self.send(&request).await?;

        let payload = self.read_frame().await?;
        let response = RedoResponse::decode(payload.as_slice())?;
        ResponseCode::try_from(response.code)
            .map_err(|_| OlrError::Protocol(format!("unknown response code {}", response.code)))
    }

    /// Ack the current position so the server may release its redo
    /// buffers.
    pub async fn confirm(&mut self, source: &str) -> Result<(), OlrError> {
        if self.c_scn == 0 {
            warn!("no scn to confirm");
            return Ok(());
        }
        let request = RedoRequest {
            code: RequestCode::Confirm as i32,
            database_name: source.to_string(),
            tm_val: Some(redo_request::TmVal::Scn(self.scn)),
            c_scn: self.c_scn,
            c_idx: self.c_idx,
        };
        self.send(&request).await
    }

    /// Pull whatever data frames are available. Returns the decoded JSON
    /// payloads, which may be empty when the poll timed out.
    pub async fn read_events(&mut self) -> Result<Vec<String>, OlrError> {
        if let Some(bytes) = self.transport.read_some().await? {
            self.decoder.push(&bytes);
        }
        let mut events = Vec::new();
        while let Some(frame) = self.decoder.next_frame() {
            let text = String::from_utf8(frame)
                .map_err(|e| OlrError::MalformedEvent(format!("payload is not utf-8: {e}")))?;
            events.push(text);
        }
        Ok(events)
    }

    async fn send(&mut self, request: &RedoRequest) -> Result<(), OlrError> {
        let framed = encode_frame(&request.encode_to_vec());
        self.transport.write_all(&framed).await
    }

    /// Wait for exactly one framed message.
    async fn read_frame(&mut self) -> Result<Vec<u8>, OlrError> {
        loop {
            if let Some(frame) = self.decoder.next_frame() {
                return Ok(frame);
            }
            match self.transport.read_some().await? {
                Some(bytes) => self.decoder.push(&bytes),
                None => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// In-memory transport: scripted inbound frames, captured outbound
    /// bytes.
    #[derive(Default)]
    struct MemTransport {
        inbound: VecDeque<Vec<u8>>,
        outbound: Vec<Vec<u8>>,
    }

    #[async_trait]
    impl Transport for MemTransport {
        async fn read_some(&mut self) -> Result<Option<Vec<u8>>, OlrError> {
            Ok(self.inbound.pop_front())
        }

        async fn write_all(&mut self, bytes: &[u8]) -> Result<(), OlrError> {
            self.outbound.push(bytes.to_vec());
            Ok(())
        }
    }

    fn framed_response(code: ResponseCode) -> Vec<u8> {
        let resp = RedoResponse {
            code: code as i32,
            scn: None,
            c_scn: None,
            c_idx: None,
        };
        encode_frame(&resp.encode_to_vec())
    }

    fn sent_request(client_bytes: &[u8]) -> RedoRequest {
        // skip the 4-byte length prefix
        RedoRequest::decode(&client_bytes[4..]).unwrap()
    }

    #[tokio::test]
    async fn continue_resumes_past_last_known_position() {
        let mut transport = MemTransport::default();
        transport
            .inbound
            .push_back(framed_response(ResponseCode::Replicate));
        let mut client = OlrClient::new(transport);
        client.init_scns(1000, 990, 5);

        let code = client.start_or_continue("ORCLCDB", false).await.unwrap();
        assert_eq!(code, ResponseCode::Replicate);

        let req = sent_request(&client.transport.outbound[0]);
        assert_eq!(req.code, RequestCode::Continue as i32);
        assert_eq!(req.tm_val, Some(redo_request::TmVal::Scn(1001)));
        assert_eq!(req.c_scn, 991);
        assert_eq!(req.database_name, "ORCLCDB");
    }

    #[tokio::test]
    async fn fresh_start_requests_from_zero() {
        let mut transport = MemTransport::default();
        transport
            .inbound
            .push_back(framed_response(ResponseCode::Ready));
        let mut client = OlrClient::new(transport);

        let code = client.start_or_continue("ORCLCDB", true).await.unwrap();
        assert_eq!(code, ResponseCode::Ready);
        let req = sent_request(&client.transport.outbound[0]);
        assert_eq!(req.code, RequestCode::Start as i32);
        assert_eq!(req.tm_val, Some(redo_request::TmVal::Scn(0)));
        assert_eq!(req.c_scn, 0);
    }

    #[tokio::test]
    async fn confirm_sends_current_triple() {
        let mut client = OlrClient::new(MemTransport::default());
        client.set_scns(1234, 1200, 7);
        client.confirm("ORCLCDB").await.unwrap();
        let req = sent_request(&client.transport.outbound[0]);
        assert_eq!(req.code, RequestCode::Confirm as i32);
        assert_eq!(req.tm_val, Some(redo_request::TmVal::Scn(1234)));
        assert_eq!(req.c_scn, 1200);
        assert_eq!(req.c_idx, 7);
    }

    #[tokio::test]
    async fn confirm_without_position_is_a_noop() {
        let mut client = OlrClient::new(MemTransport::default());
        client.confirm("ORCLCDB").await.unwrap();
        assert!(client.transport.outbound.is_empty());
    }

    #[tokio::test]
    async fn scns_never_move_back_on_zero() {
        let mut client = OlrClient::new(MemTransport::default());
        client.set_scns(100, 90, 1);
        client.set_scns(0, 0, 0);
        assert_eq!(client.scn(), 100);
        assert_eq!(client.c_scn(), 90);
        assert_eq!(client.c_idx(), 1);
    }

    #[tokio::test]
    async fn read_events_drains_complete_frames() {
        let mut transport = MemTransport::default();
        let mut bytes = encode_frame(br#"{"op":"begin"}"#);
        bytes.extend_from_slice(&encode_frame(br#"{"op":"commit"}"#));
        transport.inbound.push_back(bytes);
        let mut client = OlrClient::new(transport);

        let events = client.read_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], r#"{"op":"begin"}"#);
    }
}
