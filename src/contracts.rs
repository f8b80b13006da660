use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, sol};

use crate::{
    chain::Chain,
    rpc::{Error, Receipt},
};

sol! {
    interface IController {
        function initialize(address controllerLogic, uint256 cap) external;

        function cap() external view returns (uint256);
    }
}

/// Functions a controller artifact must expose to be bound.
pub const CONTROLLER_FUNCTIONS: &[&str] = &["initialize", "cap"];

pub struct Controller;

impl Controller {
    /// Treats the code at `address` as a controller. Binding to the proxy's
    /// address routes every call through the proxy.
    pub fn at<C: Chain>(address: Address, chain: C) -> ControllerBinding<C> {
        ControllerBinding { address, chain }
    }
}

#[derive(Clone, Debug)]
pub struct ControllerBinding<C: Chain> {
    address: Address,
    chain: C,
}

impl<C: Chain> ControllerBinding<C> {
    pub fn address(&self) -> Address {
        self.address
    }

    async fn send<T: SolCall>(&self, call: T) -> Result<Receipt, Error> {
        self.chain
            .transact(self.address, Bytes::from(call.abi_encode()))
            .await
    }

    async fn view<T: SolCall>(&self, call: T) -> Result<T::Return, Error> {
        let data = self
            .chain
            .call(self.address, Bytes::from(call.abi_encode()))
            .await?;
        Ok(T::abi_decode_returns(&data, true)?)
    }

    pub async fn initialize(&self, controller_logic: Address, cap: U256) -> Result<Receipt, Error> {
        self.send(IController::initializeCall {
            controllerLogic: controller_logic,
            cap,
        })
        .await
    }

    pub async fn cap(&self) -> Result<U256, Error> {
        Ok(self.view(IController::capCall {}).await?._0)
    }
}
