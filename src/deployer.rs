use alloy_primitives::{Address, B256};
use indexmap::IndexMap;
use thiserror::Error as ThisError;
use tracing::{info, warn};

use crate::{
    artifacts::{self, Registry},
    chain::Chain,
    rpc,
};

#[derive(ThisError, Debug)]
pub enum Error {
    #[error(transparent)]
    Artifact(#[from] artifacts::Error),
    #[error("Deployment of {name} failed: {source}")]
    Deploy { name: String, source: rpc::Error },
    #[error("{0} has not been deployed in this run")]
    NotDeployed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deployed {
    pub name: String,
    pub address: Address,
    pub transaction_hash: B256,
}

/// Deploys registry artifacts against a chain and remembers where each one
/// landed.
pub struct Deployer<C: Chain> {
    chain: C,
    registry: Registry,
    deployed: IndexMap<String, Deployed>,
}

impl<C: Chain> Deployer<C> {
    pub fn new(chain: C, registry: Registry) -> Self {
        Self {
            chain,
            registry,
            deployed: IndexMap::new(),
        }
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub async fn deploy(&mut self, name: &str) -> Result<Deployed, Error> {
        let artifact = self.registry.require(name)?;
        info!("Deploying {}", artifact.contract_name);
        let receipt = self
            .chain
            .deploy(&artifact.bytecode)
            .await
            .map_err(|source| Error::Deploy {
                name: name.to_string(),
                source,
            })?;
        let address = receipt.contract_address.ok_or_else(|| Error::Deploy {
            name: name.to_string(),
            source: rpc::Error::MissingContractAddress(receipt.transaction_hash),
        })?;
        let deployed = Deployed {
            name: name.to_string(),
            address,
            transaction_hash: receipt.transaction_hash,
        };
        info!(
            "Deployed {} at {} (tx {})",
            name, address, receipt.transaction_hash
        );
        if let Some(previous) = self.deployed.insert(name.to_string(), deployed.clone()) {
            warn!(
                "{} redeployed, replacing instance at {}",
                name, previous.address
            );
        }
        Ok(deployed)
    }

    pub fn deployed(&self, name: &str) -> Result<Address, Error> {
        self.deployed
            .get(name)
            .map(|d| d.address)
            .ok_or_else(|| Error::NotDeployed(name.to_string()))
    }

    pub fn deployments(&self) -> impl Iterator<Item = &Deployed> {
        self.deployed.values()
    }
}
