use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
};

use alloy_primitives::{Address, B256, Bytes, U64, U256};
use alloy_sol_types::SolCall;
use serde_json::json;

use crate::{
    artifacts::{Artifact, CONTROLLER, PROXY, Registry},
    chain::Chain,
    contracts::IController,
    rpc::{Error, Receipt},
};

pub const PROXY_BYTECODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52, 0x01];
pub const CONTROLLER_BYTECODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52, 0x02];

pub fn controller_abi() -> serde_json::Value {
    json!([
        {
            "type": "function",
            "name": "initialize",
            "inputs": [
                { "name": "controllerLogic", "type": "address" },
                { "name": "cap", "type": "uint256" }
            ],
            "outputs": [],
            "stateMutability": "nonpayable"
        },
        {
            "type": "function",
            "name": "cap",
            "inputs": [],
            "outputs": [{ "name": "", "type": "uint256" }],
            "stateMutability": "view"
        }
    ])
}

pub fn test_registry() -> Registry {
    Registry::new()
        .with(
            PROXY,
            Artifact::new(PROXY, Bytes::from_static(PROXY_BYTECODE), json!([])),
        )
        .with(
            CONTROLLER,
            Artifact::new(
                CONTROLLER,
                Bytes::from_static(CONTROLLER_BYTECODE),
                controller_abi(),
            ),
        )
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockEvent {
    /// `address` is `None` when the deployment was rejected.
    Deploy {
        bytecode: Bytes,
        address: Option<Address>,
    },
    Code(Address),
    Transact { to: Address, selector: [u8; 4] },
    Call { to: Address, selector: [u8; 4] },
}

#[derive(Debug, Default)]
struct MockContract {
    code: Bytes,
    logic: Option<Address>,
    cap: U256,
}

#[derive(Debug, Default)]
struct State {
    preset_addresses: VecDeque<Address>,
    next_address: u64,
    nonce: u64,
    contracts: HashMap<Address, MockContract>,
    failing_bytecode: HashSet<Bytes>,
    codeless: HashSet<Address>,
    cap_override: Option<U256>,
    events: Vec<MockEvent>,
}

impl State {
    fn next_hash(&mut self) -> B256 {
        self.nonce += 1;
        B256::left_padding_from(&self.nonce.to_be_bytes())
    }

    fn next_address(&mut self) -> Address {
        self.preset_addresses.pop_front().unwrap_or_else(|| {
            self.next_address += 1;
            let mut bytes = [0u8; 20];
            bytes[12..].copy_from_slice(&(0x1000 + self.next_address).to_be_bytes());
            Address::from(bytes)
        })
    }

    fn receipt(&mut self, contract_address: Option<Address>) -> Receipt {
        Receipt {
            transaction_hash: self.next_hash(),
            contract_address,
            block_number: Some(U64::from(self.nonce)),
            status: Some(U64::from(1)),
            gas_used: Some(U256::from(21_000)),
        }
    }
}

fn selector(data: &[u8]) -> [u8; 4] {
    let mut selector = [0u8; 4];
    let n = data.len().min(4);
    selector[..n].copy_from_slice(&data[..n]);
    selector
}

/// In-memory chain. Every deployed contract answers the controller interface
/// against its own storage: `initialize` succeeds once per address and `cap`
/// returns whatever that address was initialized with.
#[derive(Clone, Debug, Default)]
pub struct MockChain {
    state: Arc<Mutex<State>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out `addresses` to the next deployments, in order.
    pub fn with_addresses(self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.state
            .lock()
            .unwrap()
            .preset_addresses
            .extend(addresses);
        self
    }

    /// Rejects every deployment of `bytecode`.
    pub fn failing_deploy(self, bytecode: Bytes) -> Self {
        self.state.lock().unwrap().failing_bytecode.insert(bytecode);
        self
    }

    /// Reports empty code at `address`, as a node does for an account that
    /// holds no contract.
    pub fn without_code_at(self, address: Address) -> Self {
        self.state.lock().unwrap().codeless.insert(address);
        self
    }

    /// Answers every `cap()` call with `cap`, whatever was initialized.
    pub fn with_cap_override(self, cap: U256) -> Self {
        self.state.lock().unwrap().cap_override = Some(cap);
        self
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn deploy_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, MockEvent::Deploy { .. }))
            .count()
    }

    pub fn cap_at(&self, address: Address) -> Option<U256> {
        self.state
            .lock()
            .unwrap()
            .contracts
            .get(&address)
            .map(|c| c.cap)
    }

    pub fn logic_at(&self, address: Address) -> Option<Address> {
        self.state
            .lock()
            .unwrap()
            .contracts
            .get(&address)
            .and_then(|c| c.logic)
    }
}

impl Chain for MockChain {
    async fn deploy(&self, bytecode: &Bytes) -> Result<Receipt, Error> {
        let mut state = self.state.lock().unwrap();
        if state.failing_bytecode.contains(bytecode) {
            state.events.push(MockEvent::Deploy {
                bytecode: bytecode.clone(),
                address: None,
            });
            return Err(Error::Rpc {
                code: -32000,
                message: "contract creation rejected".to_string(),
            });
        }
        let address = state.next_address();
        state.contracts.insert(
            address,
            MockContract {
                code: bytecode.clone(),
                ..Default::default()
            },
        );
        state.events.push(MockEvent::Deploy {
            bytecode: bytecode.clone(),
            address: Some(address),
        });
        Ok(state.receipt(Some(address)))
    }

    async fn transact(&self, to: Address, data: Bytes) -> Result<Receipt, Error> {
        let mut state = self.state.lock().unwrap();
        state.events.push(MockEvent::Transact {
            to,
            selector: selector(&data),
        });
        let receipt = state.receipt(None);
        let hash = receipt.transaction_hash;
        let call = IController::initializeCall::abi_decode(&data, true)?;
        let contract = state.contracts.get_mut(&to).ok_or(Error::Reverted(hash))?;
        if contract.logic.is_some() {
            return Err(Error::Reverted(hash));
        }
        contract.logic = Some(call.controllerLogic);
        contract.cap = call.cap;
        Ok(receipt)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, Error> {
        let mut state = self.state.lock().unwrap();
        state.events.push(MockEvent::Call {
            to,
            selector: selector(&data),
        });
        let Some(contract) = state.contracts.get(&to) else {
            return Ok(Bytes::new());
        };
        if selector(&data) != IController::capCall::SELECTOR {
            return Err(Error::Rpc {
                code: 3,
                message: "execution reverted".to_string(),
            });
        }
        let cap = state.cap_override.unwrap_or(contract.cap);
        Ok(Bytes::from(IController::capCall::abi_encode_returns(&(cap,))))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, Error> {
        let mut state = self.state.lock().unwrap();
        state.events.push(MockEvent::Code(address));
        if state.codeless.contains(&address) {
            return Ok(Bytes::new());
        }
        Ok(state
            .contracts
            .get(&address)
            .map(|c| c.code.clone())
            .unwrap_or_default())
    }
}
