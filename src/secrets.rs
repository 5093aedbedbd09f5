//! Opaque secrets bag.
//!
//! Secrets are handed to the reconciler as plain key/value pairs (RPC provider API keys, the pool
//! messenger key). Endpoint URLs in the registry reference them as `${NAME}` placeholders.

use crate::{constants::POOL_MESSENGER_KEY_ENV, error::ReconcilerError};
use alloy::{network::EthereumWallet, signers::local::PrivateKeySigner};
use std::{collections::HashMap, fmt, str::FromStr};
use url::Url;

/// A bag of secrets keyed by name.
#[derive(Clone, Default)]
pub struct Secrets(HashMap<String, String>);

impl Secrets {
    /// Collects every variable of the process environment.
    pub fn from_env() -> Self {
        Self(std::env::vars().collect())
    }

    /// Sets a secret.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns the secret with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Replaces every `${NAME}` placeholder of `template` with the matching secret.
    pub fn expand(&self, template: &str) -> Result<String, ReconcilerError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start + 2..].find('}') else {
                break;
            };
            let name = &rest[start + 2..start + 2 + len];
            let value =
                self.get(name).ok_or_else(|| ReconcilerError::MissingSecret(name.to_string()))?;
            out.push_str(&rest[..start]);
            out.push_str(value);
            rest = &rest[start + 3 + len..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Expands an endpoint template into a [`Url`].
    pub fn endpoint(&self, template: &str) -> Result<Url, ReconcilerError> {
        let expanded = self.expand(template)?;
        expanded.parse().map_err(|err: url::ParseError| ReconcilerError::InvalidEndpoint {
            template: template.to_string(),
            reason: err.to_string(),
        })
    }

    /// Builds the wallet of the pool messenger, the account that submits pool writes.
    pub fn pool_messenger_wallet(&self) -> Result<EthereumWallet, ReconcilerError> {
        let key = self
            .get(POOL_MESSENGER_KEY_ENV)
            .ok_or_else(|| ReconcilerError::MissingSecret(POOL_MESSENGER_KEY_ENV.to_string()))?;
        let signer = PrivateKeySigner::from_str(key.trim())
            .map_err(|err| ReconcilerError::InvalidSigner(err.to_string()))?;
        Ok(EthereumWallet::from(signer))
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secrets").field(&self.0.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{
        network::{Ethereum, NetworkWallet},
        primitives::address,
    };

    #[test]
    fn expands_placeholders() {
        let secrets = Secrets::default().with("INFURA_API_KEY", "abc").with("OTHER", "x");
        assert_eq!(
            secrets.expand("https://arbitrum-sepolia.infura.io/v3/${INFURA_API_KEY}").unwrap(),
            "https://arbitrum-sepolia.infura.io/v3/abc"
        );
        assert_eq!(secrets.expand("${OTHER}-${OTHER}").unwrap(), "x-x");
        assert_eq!(secrets.expand("https://node.example").unwrap(), "https://node.example");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Secrets::default().expand("https://a.b/${ALCHEMY_API_KEY}").unwrap_err();
        assert!(matches!(err, ReconcilerError::MissingSecret(name) if name == "ALCHEMY_API_KEY"));
    }

    #[test]
    fn pool_messenger_wallet() {
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let wallet = Secrets::default().with(POOL_MESSENGER_KEY_ENV, key).pool_messenger_wallet();
        assert_eq!(
            NetworkWallet::<Ethereum>::default_signer_address(&wallet.unwrap()),
            address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );

        let err = Secrets::default().pool_messenger_wallet().unwrap_err();
        assert!(matches!(err, ReconcilerError::MissingSecret(_)));

        let err =
            Secrets::default().with(POOL_MESSENGER_KEY_ENV, "nope").pool_messenger_wallet();
        assert!(matches!(err, Err(ReconcilerError::InvalidSigner(_))));
    }

    #[test]
    fn debug_hides_values() {
        let secrets = Secrets::default().with("KEY", "super-secret");
        assert!(!format!("{secrets:?}").contains("super-secret"));
    }
}
