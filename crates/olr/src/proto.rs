//! Hand-derived prost messages for the OpenLogReplicator redo protocol.
//! Only the fields this client exchanges are modelled; unknown fields are
//! skipped by prost on decode.

/// Client → server request.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RedoRequest {
    #[prost(enumeration = "RequestCode", tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub database_name: String,
    /// resume position, either an scn or a timestamp string
    #[prost(oneof = "redo_request::TmVal", tags = "3, 4")]
    pub tm_val: Option<redo_request::TmVal>,
    #[prost(uint64, tag = "5")]
    pub c_scn: u64,
    #[prost(uint64, tag = "6")]
    pub c_idx: u64,
}

pub mod redo_request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum TmVal {
        #[prost(uint64, tag = "3")]
        Scn(u64),
        #[prost(string, tag = "4")]
        Tms(String),
    }
}

/// Server → client control response. Data payloads are raw JSON frames,
/// not protobuf.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RedoResponse {
    #[prost(enumeration = "ResponseCode", tag = "1")]
    pub code: i32,
    #[prost(uint64, optional, tag = "2")]
    pub scn: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub c_scn: Option<u64>,
    #[prost(uint64, optional, tag = "4")]
    pub c_idx: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum RequestCode {
    Info = 0,
    Start = 1,
    Continue = 2,
    Confirm = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ResponseCode {
    Ready = 0,
    FailedStart = 1,
    Starting = 2,
    AlreadyStarted = 3,
    Replicate = 4,
    Payload = 5,
    InvalidDatabase = 6,
    InvalidCommand = 7,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn request_round_trip() {
        let req = RedoRequest {
            code: RequestCode::Continue as i32,
            database_name: "ORCLCDB".into(),
            tm_val: Some(redo_request::TmVal::Scn(1001)),
            c_scn: 991,
            c_idx: 0,
        };
        let bytes = req.encode_to_vec();
        let back = RedoRequest::decode(bytes.as_slice()).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn response_decode_defaults() {
        let resp = RedoResponse {
            code: ResponseCode::Replicate as i32,
            scn: None,
            c_scn: None,
            c_idx: None,
        };
        let bytes = resp.encode_to_vec();
        let back = RedoResponse::decode(bytes.as_slice()).unwrap();
        assert_eq!(back.code, ResponseCode::Replicate as i32);
    }
}
