use std::future::Future;

use alloy_primitives::{Address, Bytes};

use crate::rpc::{Error, Receipt};

/// The external execution environment the deployment runs against. Every
/// method resolves only once the environment has confirmed the effect.
pub trait Chain: Send + Sync + Clone + 'static {
    /// Sends a contract creation transaction and waits for its receipt. The
    /// returned receipt always carries the new contract address.
    fn deploy(&self, bytecode: &Bytes) -> impl Future<Output = Result<Receipt, Error>> + Send;

    fn transact(
        &self,
        to: Address,
        data: Bytes,
    ) -> impl Future<Output = Result<Receipt, Error>> + Send;

    /// Read-only call against the latest state.
    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = Result<Bytes, Error>> + Send;

    fn code_at(&self, address: Address) -> impl Future<Output = Result<Bytes, Error>> + Send;
}
