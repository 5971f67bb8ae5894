//! Sans-I/O response parsing.
//!
//! [`lexer`] tokenizes framed response bytes; [`response`] applies the
//! IMAP4rev1 grammar (plus the extension grammars) on top of the token
//! stream. Neither touches the network.

pub mod lexer;
pub mod response;

pub use response::{
    Address, BodyStructure, Envelope, EsearchResult, FetchItem, Response, ResponseParser,
    StatusResponse, ThreadNode, UntaggedResponse,
};
