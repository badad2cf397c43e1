use std::fmt::Formatter;
use std::io;
use std::result;

#[derive(Debug)]
pub enum Error {
    /// Key length does not match the fixed key size of the trie.
    InvalidKeyLength { expected: usize, actual: usize },
    /// Symbol is outside of the alphabet of the child container.
    InvalidSymbol(u8),
    NotFound,
    /// Record at given offset is shorter than expected (truncated file).
    RecordSizeMismatch { offset: u64, expected: usize },
    IO(io::Error),
    /// Structure is corrupted or an internal logic defect was hit.
    InvariantViolation(String),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub(crate) fn check_key(expected: usize, key: &[u8]) -> Result<()> {
        if key.len() != expected {
            return Err(Error::InvalidKeyLength {
                expected,
                actual: key.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn invariant(msg: String) -> Self {
        log::error!("Invariant violation: {}", msg);
        Error::InvariantViolation(msg)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidKeyLength { expected, actual } => write!(
                f,
                "Invalid key length: expected {} but got {}.",
                expected, actual
            ),
            Error::InvalidSymbol(symbol) => write!(f, "Invalid symbol: 0x{:02x}.", symbol),
            Error::NotFound => write!(f, "Key not found."),
            Error::RecordSizeMismatch { offset, expected } => write!(
                f,
                "Record size mismatch (offset: {}): expected {} bytes.",
                offset, expected
            ),
            Error::IO(io) => write!(f, "IO error: '{}'.", io),
            Error::InvariantViolation(msg) => write!(f, "Invariant violation: '{}'.", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IO(io) => Some(io),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IO(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_key() {
        assert!(Error::check_key(3, b"abc").is_ok());
        match Error::check_key(3, b"abcd") {
            Err(Error::InvalidKeyLength { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 4);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let e = Error::RecordSizeMismatch {
            offset: 42,
            expected: 2073,
        };
        assert_eq!(
            e.to_string(),
            "Record size mismatch (offset: 42): expected 2073 bytes."
        );
        let e: Error = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(std::error::Error::source(&e).is_some());
    }
}
