//! Error types for the sequence manager service.
//!
//! This module defines the central `Error` enum, which captures every failure
//! a gRPC handler can report. It implements `From<Error>` for
//! `tonic::Status` so handlers can return it with `?`, and
//! [`status_to_seq_error`] maps a received `Status` back into the
//! [`seqmgr::Error`] kind the allocators understand.
//!
//! ## Status mapping
//!
//! | `seqmgr::Error`  | `tonic::Code`        |
//! |------------------|----------------------|
//! | `OutOfSpace`     | `ResourceExhausted`  |
//! | `Protocol`       | `InvalidArgument`    |
//! | `InvalidRange`   | `DataLoss`           |
//! | `Persistence`    | `Internal`           |
//! | `Unreachable`    | `Unavailable`        |
//! | `Shutdown`       | `Unavailable`        |

use tonic::{Code, Status};

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the sequence manager service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// The allocator refused or failed the request.
    #[error("Sequence error: {0}")]
    Seq(#[from] seqmgr::Error),

    /// The client request was malformed.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The blocking task serving the request died.
    #[error("Task error: {context}")]
    TaskError { context: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::Seq(e) => seq_error_to_status(&e),
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::TaskError { context } => Status::internal(format!("Task error: {context}")),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}

fn seq_error_to_status(err: &seqmgr::Error) -> Status {
    let message = err.to_string();
    match err {
        seqmgr::Error::OutOfSpace => Status::resource_exhausted(message),
        seqmgr::Error::Protocol { .. } | seqmgr::Error::InvalidConfig { .. } => {
            Status::invalid_argument(message)
        }
        seqmgr::Error::InvalidRange { .. } => Status::data_loss(message),
        seqmgr::Error::Unreachable { .. } | seqmgr::Error::Shutdown => {
            Status::unavailable(message)
        }
        _ => Status::internal(message),
    }
}

/// Maps a `Status` received from a peer onto the allocator's error kinds.
///
/// Exhaustion and protocol violations keep their meaning; anything else means
/// the peer could not serve the request and surfaces as
/// [`seqmgr::Error::Unreachable`].
pub fn status_to_seq_error(status: &Status) -> seqmgr::Error {
    match status.code() {
        Code::ResourceExhausted => seqmgr::Error::OutOfSpace,
        Code::InvalidArgument | Code::Unimplemented | Code::DataLoss => seqmgr::Error::Protocol {
            reason: format!("peer rejected request: {}", status.message()),
        },
        code => seqmgr::Error::Unreachable {
            reason: format!("{code:?}: {}", status.message()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqmgr::StoreError;

    #[test]
    fn seq_errors_map_to_expected_codes() {
        let cases = [
            (seqmgr::Error::OutOfSpace, Code::ResourceExhausted),
            (
                seqmgr::Error::Protocol {
                    reason: "unknown opcode 9".into(),
                },
                Code::InvalidArgument,
            ),
            (
                seqmgr::Error::InvalidRange { start: 2, end: 1 },
                Code::DataLoss,
            ),
            (
                seqmgr::Error::Persistence(StoreError::NoData),
                Code::Internal,
            ),
            (
                seqmgr::Error::Unreachable {
                    reason: "down".into(),
                },
                Code::Unavailable,
            ),
            (seqmgr::Error::Shutdown, Code::Unavailable),
        ];
        for (err, code) in cases {
            assert_eq!(Status::from(Error::from(err.clone())).code(), code, "{err}");
        }
    }

    #[test]
    fn statuses_map_back_to_seq_errors() {
        assert_eq!(
            status_to_seq_error(&Status::resource_exhausted("gone")),
            seqmgr::Error::OutOfSpace
        );
        assert!(matches!(
            status_to_seq_error(&Status::invalid_argument("bad opcode")),
            seqmgr::Error::Protocol { .. }
        ));
        assert!(matches!(
            status_to_seq_error(&Status::unavailable("connection refused")),
            seqmgr::Error::Unreachable { .. }
        ));
        assert!(matches!(
            status_to_seq_error(&Status::internal("disk full")),
            seqmgr::Error::Unreachable { .. }
        ));
    }

    #[test]
    fn out_of_space_survives_a_round_trip() {
        let status = Status::from(Error::Seq(seqmgr::Error::OutOfSpace));
        assert_eq!(status_to_seq_error(&status), seqmgr::Error::OutOfSpace);
    }

    #[test]
    fn shutdown_is_unavailable() {
        assert_eq!(Status::from(Error::ServiceShutdown).code(), Code::Unavailable);
    }
}
