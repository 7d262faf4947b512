//! Data types shared by the codec, resolver and assembler.

use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};
use thiserror::Error;

/// Error types for Candy Guard encoding and instruction assembly
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CandyGuardError {
    #[error("Guard `{0}` is not registered")]
    UnregisteredGuard(String),

    #[error("Guard `{0}` is already registered")]
    DuplicateGuard(String),

    #[error("Group label `{label}` is longer than {max} bytes")]
    GroupLabelTooLong { label: String, max: usize },

    #[error("Group label {0:?} ends with a padding character")]
    GroupLabelPadding(String),

    #[error("Group label `{0}` is used by more than one group")]
    DuplicateGroupLabel(String),

    #[error("A group must be selected, available groups: {0:?}")]
    GroupRequired(Vec<String>),

    #[error("Group `{label}` does not exist, available groups: {available:?}")]
    UnknownGroup {
        label: String,
        available: Vec<String>,
    },

    #[error("Guard `{name}` is not enabled{}", group_suffix(.group))]
    GuardNotEnabled { name: String, group: Option<String> },

    #[error("Guard `{0}` does not support the route instruction")]
    RouteNotSupported(String),

    #[error("Guard `{0}` requires mint settings that were not provided")]
    MissingMintSettings(String),

    #[error("Guard `{guard}` received settings for `{found}`")]
    SettingsMismatch { guard: String, found: String },

    #[error("Guard `{guard}` serialized to {actual} bytes, expected {expected}")]
    SettingsSizeMismatch {
        guard: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid settings for guard `{guard}`: {reason}")]
    InvalidGuardSettings { guard: String, reason: String },

    #[error("{count} guards do not fit in a {max}-bit feature flags word")]
    FeatureFlagOverflow { count: usize, max: usize },

    #[error("Malformed buffer: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    MalformedBuffer {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("Invalid account data: {0}")]
    InvalidAccountData(String),

    #[error("Invalid configuration JSON: {0}")]
    InvalidJson(String),

    #[error("Failed to encode instruction data: {0}")]
    InstructionEncoding(String),
}

fn group_suffix(group: &Option<String>) -> String {
    match group {
        Some(label) => format!(" in group `{}`", label),
        None => String::new(),
    }
}

/// An account appended to an instruction by an enabled guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingAccount {
    pub address: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl RemainingAccount {
    pub fn readonly(address: Pubkey) -> Self {
        Self {
            address,
            is_signer: false,
            is_writable: false,
        }
    }

    pub fn writable(address: Pubkey) -> Self {
        Self {
            address,
            is_signer: false,
            is_writable: true,
        }
    }

    pub fn signer(address: Pubkey) -> Self {
        Self {
            address,
            is_signer: true,
            is_writable: false,
        }
    }

    pub fn to_account_meta(&self) -> AccountMeta {
        if self.is_writable {
            AccountMeta::new(self.address, self.is_signer)
        } else {
            AccountMeta::new_readonly(self.address, self.is_signer)
        }
    }
}

/// What a single guard contributes to a mint or route instruction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedGuardArgs {
    /// Guard-specific argument bytes
    pub arguments: Vec<u8>,
    /// Accounts the on-chain guard reads, in the order it reads them
    pub remaining_accounts: Vec<RemainingAccount>,
}

impl ParsedGuardArgs {
    pub fn accounts(remaining_accounts: Vec<RemainingAccount>) -> Self {
        Self {
            arguments: Vec::new(),
            remaining_accounts,
        }
    }
}

/// Addresses every mint and route parser may need
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardContext {
    /// The Candy Guard program the instruction targets
    pub program_id: Pubkey,
    pub candy_guard: Pubkey,
    pub candy_machine: Pubkey,
    /// Pays for the mint and any guard payments
    pub payer: Pubkey,
    /// The wallet that receives the NFT
    pub minter: Pubkey,
    /// The NFT mint being created (ignored by route parsers)
    pub nft_mint: Pubkey,
}

/// Concatenated guard contributions, ready to be wrapped into an instruction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardInstructionArgs {
    /// Argument bytes of every contributing guard, in guard order
    pub arguments: Vec<u8>,
    /// Remaining account metas, in guard order
    pub accounts: Vec<AccountMeta>,
    /// Accounts that must sign the transaction
    pub signers: Vec<Pubkey>,
}

impl GuardInstructionArgs {
    /// Build the account metas and signer list from collected guard output.
    ///
    /// Accounts contributed by several guards are passed through as-is.
    pub fn from_parts(arguments: Vec<u8>, remaining_accounts: &[RemainingAccount]) -> Self {
        let accounts = remaining_accounts
            .iter()
            .map(RemainingAccount::to_account_meta)
            .collect();
        let signers = remaining_accounts
            .iter()
            .filter(|account| account.is_signer)
            .map(|account| account.address)
            .collect();

        Self {
            arguments,
            accounts,
            signers,
        }
    }
}
