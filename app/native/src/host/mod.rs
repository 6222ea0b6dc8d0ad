//! Host interface: the transport to connected client processes.
//!
//! The tiling engine never talks to a window server directly. It asks a
//! [`WindowHost`] to enumerate the connected processes and to invoke selectors on
//! objects living inside them. Every call is asynchronous and may fail; failures
//! are reported as [`HostError`] and handled by the caller (usually by dropping the
//! affected item from the cycle).
//!
//! [`selectors`] wraps the raw calls in typed helpers. [`SimulatedHost`] is an
//! in-memory implementation with latency and failure injection.

pub mod selectors;
mod simulated;

use futures::future::BoxFuture;
pub use simulated::{SimPlacement, SimWindow, SimulatedHost};
use thiserror::Error;

use crate::tiling::state::{ObjectRef, Pid, ProcessHandle, Rect};

/// Result type for host calls.
pub type HostResult<T> = Result<T, HostError>;

/// Errors reported by a host.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HostError {
    /// The transport failed before a reply arrived.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The target process is no longer connected.
    #[error("Process {0} is no longer connected")]
    ProcessGone(Pid),

    /// The selector returned nil where a value was required.
    #[error("Selector `{selector}` returned null")]
    NullResult { selector: String },

    /// The reply had a different type than requested.
    #[error("Selector `{selector}` returned {found}, expected {expected:?}")]
    UnexpectedType {
        selector: String,
        expected: ReturnType,
        found: &'static str,
    },

    /// The object reference is not known to the process.
    #[error("Unknown object {0}")]
    UnknownObject(ObjectRef),

    /// The receiver does not respond to the selector.
    #[error("Unsupported selector `{0}`")]
    UnsupportedSelector(String),
}

/// Receiver of a query: a class (for class methods) or an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryTarget {
    Class(&'static str),
    Object(ObjectRef),
}

/// Argument passed along with a selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryArg {
    Rect(Rect),
    Bool(bool),
    Int(i64),
    Double(f64),
    Null,
}

/// Return type requested from a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Bool,
    Int,
    UInt,
    Rect,
    /// An object reference, or a collection of them.
    Object,
    /// No return value.
    None,
}

/// A decoded query reply.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Rect(Rect),
    Object(ObjectRef),
    Objects(Vec<ObjectRef>),
    /// The selector returned nil.
    Null,
    /// The selector has no return value.
    Void,
}

impl QueryValue {
    /// Short name of the variant, for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Rect(_) => "rect",
            Self::Object(_) => "object",
            Self::Objects(_) => "objects",
            Self::Null => "null",
            Self::Void => "void",
        }
    }
}

/// Transport to the connected client processes.
///
/// Implementations must be cheap to call concurrently: a single layout cycle issues
/// one query per window attribute, all in flight at the same time.
pub trait WindowHost: Send + Sync {
    /// Lists the currently connected processes.
    fn enumerate_processes(&self) -> BoxFuture<'_, HostResult<Vec<ProcessHandle>>>;

    /// Invokes `selector` on `target` inside process `pid` and decodes the reply as
    /// `returns`.
    fn query<'a>(
        &'a self,
        pid: Pid,
        target: QueryTarget,
        selector: &'a str,
        args: Vec<QueryArg>,
        returns: ReturnType,
    ) -> BoxFuture<'a, HostResult<QueryValue>>;

    /// Invokes `selector` on `target` inside process `pid`, ignoring any reply.
    fn command<'a>(
        &'a self,
        pid: Pid,
        target: QueryTarget,
        selector: &'a str,
        args: Vec<QueryArg>,
    ) -> BoxFuture<'a, HostResult<()>>;
}
