use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Currency code of a wallet or a price.
///
/// Wallets hold the marketplace token `AXO`; service prices are quoted in
/// `MXN`. Both use two minor digits (see [`Money`](crate::Money)).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Axo,
    Mxn,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Axo => "AXO",
            Currency::Mxn => "MXN",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AXO" => Ok(Currency::Axo),
            "MXN" => Ok(Currency::Mxn),
            other => Err(EngineError::InvalidInput(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Currency::try_from(" axo ").unwrap(), Currency::Axo);
        assert_eq!(Currency::try_from("MXN").unwrap(), Currency::Mxn);
        assert!(Currency::try_from("EUR").is_err());
    }
}
