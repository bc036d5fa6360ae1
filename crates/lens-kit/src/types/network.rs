//! Network identification for the Lens API.

use std::fmt;

use super::Address;

/// Mainnet GraphQL endpoint.
pub const API_URL: &str = "https://api.lens.dev";

/// Testnet (Mumbai) GraphQL endpoint.
pub const TESTNET_API_URL: &str = "https://api-mumbai.lens.dev";

/// LensHub proxy contract, for callers interacting with the protocol directly.
pub const LENS_HUB_CONTRACT_ADDRESS: &str = "0x60Ae865ee4C725cd04353b5AAb364553f56ceF82";

/// LensPeriphery contract (profile metadata and similar helpers).
pub const PERIPHERY_CONTRACT_ADDRESS: &str = "0xD5037d72877808cdE7F669563e9389930AF404E8";

/// The Lens network the client is connected to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Production API.
    #[default]
    Mainnet,
    /// Mumbai testnet API.
    Testnet,
    /// Self-hosted or mocked endpoint with unknown contract deployments.
    Custom,
}

impl Network {
    /// Returns true if this is mainnet.
    pub fn is_mainnet(&self) -> bool {
        matches!(self, Network::Mainnet)
    }

    /// Returns true if this is testnet.
    pub fn is_testnet(&self) -> bool {
        matches!(self, Network::Testnet)
    }

    /// Returns the network identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Custom => "custom",
        }
    }

    /// The GraphQL endpoint for this network, if it is a known one.
    pub fn api_url(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => Some(API_URL),
            Network::Testnet => Some(TESTNET_API_URL),
            Network::Custom => None,
        }
    }

    /// The LensHub contract address.
    pub fn lens_hub(&self) -> Option<Address> {
        match self {
            Network::Custom => None,
            _ => LENS_HUB_CONTRACT_ADDRESS.parse().ok(),
        }
    }

    /// The LensPeriphery contract address.
    pub fn periphery(&self) -> Option<Address> {
        match self {
            Network::Custom => None,
            _ => PERIPHERY_CONTRACT_ADDRESS.parse().ok(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
