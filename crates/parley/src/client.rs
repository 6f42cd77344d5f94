//! The calling side of the chat service.
//!
//! [`consumer::consume`] turns a record byte stream back into fragments and one
//! [`assembler::AssembledMessage`]. [`service::ChatClient`] wraps the HTTP endpoints and
//! [`session::ChatSession`] keeps a visible conversation on top of it.
use thiserror::Error;

pub mod assembler;
pub mod consumer;
pub mod decoder;
pub mod service;
pub mod session;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server refused the request before any stream was opened
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The stream ended with an `error` event. `partial` is the text received before it.
    #[error("{message}")]
    Remote { message: String, partial: String },

    #[error("Undecodable stream record: {0}")]
    Decode(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
