use alloy_primitives::U256;
use thiserror::Error as ThisError;

/// Token decimal places.
pub const DECIMALS: u8 = 18;
/// Token supply in whole units, before scaling by `DECIMALS`.
pub const SUPPLY: u64 = 10_000_000_000_000;

#[derive(ThisError, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Supply {supply} scaled by 10^{decimals} overflows 256 bits")]
    Overflow { supply: u64, decimals: u8 },
    #[error("Cap {0} does not fit in 128 bits")]
    TooLarge(U256),
}

pub fn scaled(supply: u64, decimals: u8) -> Result<U256, Error> {
    U256::from(10)
        .checked_pow(U256::from(decimals))
        .and_then(|scale| U256::from(supply).checked_mul(scale))
        .ok_or(Error::Overflow { supply, decimals })
}

/// The cap `initialize` receives: `SUPPLY × 10^DECIMALS`.
pub fn initial_cap() -> Result<U256, Error> {
    scaled(SUPPLY, DECIMALS)
}

pub fn to_display(cap: U256) -> Result<u128, Error> {
    u128::try_from(cap).map_err(|_| Error::TooLarge(cap))
}
