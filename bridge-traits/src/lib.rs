//! Transport seam between the Graph core and its host.
//!
//! The core builds [`HttpRequest`] values and hands them to whatever
//! [`HttpClient`] the host injected: the reqwest client from
//! `bridge-desktop` in applications, a scripted stub in tests. Status codes
//! travel back untouched inside [`HttpResponse`]; translating them is the
//! core's job. [`BridgeError`] is reserved for requests that never got an
//! answer.
//!
//! Implementations must be `Send + Sync`, since one client serves every
//! concurrent call and transfer made through a facade.

pub mod error;
pub mod http;

pub use error::BridgeError;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
