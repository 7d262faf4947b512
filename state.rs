//! Candy Guard account decoding.
//!
//! Layout: 8-byte discriminator, `base` (32), `bump` (1), `authority` (32),
//! then the serialized guard configuration.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use solana_sdk::pubkey::Pubkey;

use crate::{
    config::CandyGuardConfiguration,
    discriminator::account_discriminator,
    registry::{CandyGuardProgram, GuardRegistry},
    types::CandyGuardError,
};

const DISCRIMINATOR_SIZE: usize = 8;
/// Discriminator, base, bump and authority
pub const CANDY_GUARD_HEADER_SIZE: usize = DISCRIMINATOR_SIZE + 32 + 1 + 32;

/// A decoded Candy Guard account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandyGuardAccount {
    pub base: Pubkey,
    pub bump: u8,
    pub authority: Pubkey,
    pub configuration: CandyGuardConfiguration,
}

fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey, CandyGuardError> {
    let bytes: [u8; 32] = data[offset..offset + 32]
        .try_into()
        .map_err(|_| CandyGuardError::InvalidAccountData(format!("bad pubkey at {}", offset)))?;
    Ok(Pubkey::new_from_array(bytes))
}

impl CandyGuardAccount {
    /// Decode raw account data owned by `program`
    pub fn from_account_data(
        data: &[u8],
        registry: &GuardRegistry,
        program: &CandyGuardProgram,
    ) -> Result<Self, CandyGuardError> {
        if data.len() < CANDY_GUARD_HEADER_SIZE {
            return Err(CandyGuardError::InvalidAccountData(format!(
                "account is {} bytes, header needs {}",
                data.len(),
                CANDY_GUARD_HEADER_SIZE
            )));
        }
        if data[..DISCRIMINATOR_SIZE] != account_discriminator("CandyGuard") {
            return Err(CandyGuardError::InvalidAccountData(
                "not a CandyGuard account".to_string(),
            ));
        }

        let base = read_pubkey(data, 8)?;
        let bump = data[40];
        let authority = read_pubkey(data, 41)?;
        let configuration = CandyGuardConfiguration::from_bytes(
            &data[CANDY_GUARD_HEADER_SIZE..],
            registry,
            program,
        )?;

        debug!("Decoded candy guard with base {} and authority {}", base, authority);
        Ok(Self {
            base,
            bump,
            authority,
            configuration,
        })
    }

    /// Decode base64 account data as returned by `getAccountInfo`
    pub fn from_base64(
        data: &str,
        registry: &GuardRegistry,
        program: &CandyGuardProgram,
    ) -> Result<Self, CandyGuardError> {
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| CandyGuardError::InvalidAccountData(format!("invalid base64: {}", e)))?;
        Self::from_account_data(&bytes, registry, program)
    }

    /// Encode back into account data
    pub fn to_account_data(
        &self,
        registry: &GuardRegistry,
        program: &CandyGuardProgram,
    ) -> Result<Vec<u8>, CandyGuardError> {
        let settings = self.configuration.to_bytes(registry, program)?;
        let mut data = Vec::with_capacity(CANDY_GUARD_HEADER_SIZE + settings.len());
        data.extend_from_slice(&account_discriminator("CandyGuard"));
        data.extend_from_slice(self.base.as_ref());
        data.push(self.bump);
        data.extend_from_slice(self.authority.as_ref());
        data.extend_from_slice(&settings);
        Ok(data)
    }
}
