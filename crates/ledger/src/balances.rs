//! Initial currency distributions.

use serde::{Deserialize, Serialize};

use cattle_config::MosaicPreset;

use crate::{GenesisError, Result};

/// Atomic units of `balance` whole units at `divisibility`.
pub fn scale_amount(balance: u64, divisibility: u8) -> Option<u64> {
    10u64
        .checked_pow(u32::from(divisibility))
        .and_then(|factor| balance.checked_mul(factor))
}

/// One balance credited in the nemesis block, in atomic units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyDistribution {
    pub address: String,
    pub amount: u64,
}

/// Distributions per mosaic, in the order they were added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSheet {
    mosaics: Vec<(String, u8)>,
    distributions: Vec<Vec<CurrencyDistribution>>,
}

impl BalanceSheet {
    /// Sheet for `mosaics`. Every mosaic must declare its divisibility.
    pub fn new(mosaics: &[MosaicPreset]) -> Result<Self> {
        let mosaics = mosaics
            .iter()
            .enumerate()
            .map(|(index, mosaic)| {
                mosaic
                    .divisibility
                    .map(|divisibility| (mosaic.name.clone(), divisibility))
                    .ok_or_else(|| GenesisError::Unresolved(format!("divisibility of mosaic {}", index)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            distributions: vec![Vec::new(); mosaics.len()],
            mosaics,
        })
    }

    pub fn mosaic_count(&self) -> usize {
        self.mosaics.len()
    }

    /// Credits `balance` whole units of mosaic `index` to `address`.
    /// Zero balances are not recorded.
    pub fn credit(&mut self, index: usize, address: &str, balance: u64) -> Result<()> {
        if balance == 0 {
            return Ok(());
        }
        let (name, divisibility) = self.mosaics.get(index).ok_or_else(|| {
            GenesisError::Validation(format!(
                "mosaic index {} is out of range ({} mosaics)",
                index,
                self.mosaics.len()
            ))
        })?;
        let amount =
            scale_amount(balance, *divisibility).ok_or_else(|| GenesisError::BalanceOverflow {
                mosaic: name.clone(),
                balance,
                divisibility: *divisibility,
            })?;
        self.distributions[index].push(CurrencyDistribution {
            address: address.to_string(),
            amount,
        });
        Ok(())
    }

    /// Credits one whole-unit balance per mosaic, by position.
    pub fn credit_all(&mut self, address: &str, balances: &[u64]) -> Result<()> {
        for (index, balance) in balances.iter().take(self.mosaics.len()).enumerate() {
            self.credit(index, address, *balance)?;
        }
        Ok(())
    }

    pub fn distributions(&self, index: usize) -> &[CurrencyDistribution] {
        self.distributions.get(index).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn into_parts(self) -> impl Iterator<Item = ((String, u8), Vec<CurrencyDistribution>)> {
        self.mosaics.into_iter().zip(self.distributions)
    }
}
