pub mod ast;
pub mod basic_parser;
pub mod client;
pub mod error;
pub mod events;
pub mod framing;
pub mod proto;
pub mod sql_filter;
pub mod transport;

pub use ast::{OraAlterCmd, OraColumnDef, OraStatement, OracleDdlParser};
pub use basic_parser::BasicOracleParser;
pub use client::OlrClient;
pub use error::OlrError;
pub use events::OlrEnvelope;
pub use framing::FrameDecoder;
pub use proto::{RedoRequest, RedoResponse, RequestCode, ResponseCode};
pub use transport::{TcpTransport, Transport};
