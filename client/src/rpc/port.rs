//! Port type for BRP connections
//!
//! Validates port numbers on construction and deserialization and defaults to
//! the standard BRP port.

use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::constants::{DEFAULT_BRP_PORT, VALID_PORT_RANGE};
use crate::error::{Error, Result};

/// A validated port number for BRP connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Validate `port` against the accepted range
    pub fn new(port: u16) -> Result<Self> {
        if VALID_PORT_RANGE.contains(&port) {
            Ok(Self(port))
        } else {
            Err(error_stack::Report::new(Error::invalid(
                "port",
                format!(
                    "{port}: must be in range {}-{}",
                    VALID_PORT_RANGE.start(),
                    VALID_PORT_RANGE.end()
                ),
            )))
        }
    }
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = deserialize_port(deserializer)?;
        Ok(Self(port))
    }
}

impl Default for Port {
    fn default() -> Self {
        Self(DEFAULT_BRP_PORT)
    }
}

impl FromStr for Port {
    type Err = error_stack::Report<Error>;

    fn from_str(s: &str) -> Result<Self> {
        let port = s
            .trim()
            .parse::<u16>()
            .map_err(|e| error_stack::Report::new(Error::invalid("port", format!("{s}: {e}"))))?;
        Self::new(port)
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Deref for Port {
    type Target = u16;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Deserialize and validate port numbers
///
/// Accepts both number and string inputs
fn deserialize_port<'de, D>(deserializer: D) -> core::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    use std::fmt;

    use serde::de::{self, Visitor};

    struct PortVisitor;

    impl Visitor<'_> for PortVisitor {
        type Value = u16;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a port number as u16 or string")
        }

        fn visit_u64<E>(self, value: u64) -> core::result::Result<u16, E>
        where
            E: de::Error,
        {
            u16::try_from(value)
                .map_err(|_| E::custom(format!("port number {value} is out of u16 range")))
        }

        fn visit_i64<E>(self, value: i64) -> core::result::Result<u16, E>
        where
            E: de::Error,
        {
            u16::try_from(value)
                .map_err(|_| E::custom(format!("port number {value} is out of u16 range")))
        }

        fn visit_str<E>(self, value: &str) -> core::result::Result<u16, E>
        where
            E: de::Error,
        {
            value
                .parse::<u16>()
                .map_err(|_| E::custom(format!("invalid port string: {value}")))
        }
    }

    let port = deserializer.deserialize_any(PortVisitor)?;

    if VALID_PORT_RANGE.contains(&port) {
        Ok(port)
    } else {
        Err(serde::de::Error::custom(format!(
            "Invalid port {}: must be in range {}-{}",
            port,
            VALID_PORT_RANGE.start(),
            VALID_PORT_RANGE.end()
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        assert_eq!(*Port::default(), 15702);
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_number: Port = serde_json::from_str("20000").unwrap();
        let from_string: Port = serde_json::from_str("\"20000\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.to_string(), "20000");
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(serde_json::from_str::<Port>("80").is_err());
        assert!(serde_json::from_str::<Port>("65535").is_err());
        assert!(serde_json::from_str::<Port>("70000").is_err());
        assert!(Port::new(1023).is_err());
        assert!("abc".parse::<Port>().is_err());
        assert_eq!("15703".parse::<Port>().unwrap(), Port::new(15703).unwrap());
    }
}
