//! These models represent the objects passed between the caller, the orchestrator and the
//! wire.
//!
//! There are several related formats we need to interact with:
//! - chat requests, sent from a client to the server as JSON
//! - stream events, sent from the server to a client as `data:` records
//! - openai, anthropic and gemini messages, sent from an adapter to its backend
//!
//! Backend formats never appear here; each adapter converts from these internal structs.
pub mod event;
pub mod message;
pub mod request;
pub mod role;
