use thiserror::Error;

/// Errors that can surface to a binary's exit code.
///
/// Variants mirror the taxonomy in the design doc: configuration mistakes,
/// local network setup failures (recognized and given a fixed, testable
/// message), transport I/O, and receiver-side integrity failure.
#[derive(Error, Debug)]
pub enum DiodeError {
    #[error("{0}")]
    Config(String),

    #[error("Can't send from IP address {write_ip} to {read_ip}")]
    CannotSendFrom { write_ip: String, read_ip: String },

    #[error("IP address {0} is already in use")]
    AddressInUse(String),

    #[error("Can't listen on IP address {0}")]
    CannotListenOn(String),

    #[error("received data's digest does not match the EOF digest")]
    DigestMismatch,

    #[error("input ended before an EOF packet was received")]
    MissingEof,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type DiodeResult<T> = Result<T, DiodeError>;

/// Recognize a handful of well-known OS-level bind/connect failures and
/// translate them into a fixed, human-readable message instead of the raw
/// OS error text. Anything unrecognized is wrapped as-is.
pub fn classify_send_bind_error(err: std::io::Error, write_ip: &str, read_ip: &str) -> DiodeError {
    if is_unassignable_address(&err) {
        DiodeError::CannotSendFrom {
            write_ip: write_ip.to_string(),
            read_ip: read_ip.to_string(),
        }
    } else {
        DiodeError::Io(err)
    }
}

pub fn classify_receive_bind_error(err: std::io::Error, read_ip: &str) -> DiodeError {
    if err.kind() == std::io::ErrorKind::AddrInUse {
        DiodeError::AddressInUse(read_ip.to_string())
    } else if is_unassignable_address(&err) {
        DiodeError::CannotListenOn(read_ip.to_string())
    } else {
        DiodeError::Io(err)
    }
}

fn is_unassignable_address(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::AddrNotAvailable | std::io::ErrorKind::NotFound
    ) || matches!(err.raw_os_error(), Some(99) | Some(49))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_in_use_is_classified() {
        let err = std::io::Error::from(std::io::ErrorKind::AddrInUse);
        let classified = classify_receive_bind_error(err, "127.0.0.1");
        assert_eq!(
            classified.to_string(),
            "IP address 127.0.0.1 is already in use"
        );
    }

    #[test]
    fn unassignable_address_on_send_side_is_classified() {
        let err = std::io::Error::from(std::io::ErrorKind::AddrNotAvailable);
        let classified = classify_send_bind_error(err, "127.0.0.xxx", "127.0.0.1");
        assert_eq!(
            classified.to_string(),
            "Can't send from IP address 127.0.0.xxx to 127.0.0.1"
        );
    }

    #[test]
    fn unrelated_io_errors_pass_through() {
        let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let classified = classify_receive_bind_error(err, "127.0.0.1");
        assert!(matches!(classified, DiodeError::Io(_)));
    }
}
