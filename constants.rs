//! Hardcoded constants for the Candy Guard program.
//!
//! Contains program IDs, PDA seeds, the guard settings layout widths and the
//! program's compiled guard order.

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Candy Guard Program ID (mainnet/devnet)
pub const CANDY_GUARD_PROGRAM_ID: &str = "Guard1JwRhJkVH6XZhzoYxeBVQe872VH6QggF4BWmS9g";

/// Candy Machine Core Program ID (mainnet/devnet)
pub const CANDY_MACHINE_PROGRAM_ID: &str = "CndyV3LdqHUfDLmE5naZjVN8rBZz4tqhdefbAnjHG3JR";

/// Token Metadata Program ID
pub const TOKEN_METADATA_PROGRAM_ID: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";

/// Civic Gateway Program ID (used by the gatekeeper guard)
pub const GATEWAY_PROGRAM_ID: &str = "gatem74V238djXdzWnJf94Wo1DcnuGkfijbf3AuBhfs";

/// SPL Token Program ID
pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Size in bytes of the feature flags word that prefixes every guard set.
pub const FEATURE_FLAGS_SIZE: usize = 8;

/// Number of guards a feature flags word can describe.
pub const FEATURE_FLAGS_WIDTH: usize = FEATURE_FLAGS_SIZE * 8;

/// Fixed width of a group label on-chain. Shorter labels are space padded.
pub const GROUP_LABEL_SIZE: usize = 6;

/// Maximum number of additional programs a `programGate` guard can list.
pub const PROGRAM_GATE_MAX_PROGRAMS: usize = 5;

/// Guard order compiled into the Candy Guard program.
///
/// The position of a name in this list is its feature flag bit and its
/// `GuardType` index in route instructions.
pub const DEFAULT_GUARD_NAMES: [&str; 19] = [
    "botTax",
    "solPayment",
    "tokenPayment",
    "startDate",
    "thirdPartySigner",
    "tokenGate",
    "gatekeeper",
    "endDate",
    "allowList",
    "mintLimit",
    "nftPayment",
    "redeemedAmount",
    "addressGate",
    "nftGate",
    "nftBurn",
    "tokenBurn",
    "freezeSolPayment",
    "freezeTokenPayment",
    "programGate",
];

/// PDA seeds (match the Candy Guard program source)
pub const MINT_LIMIT_SEED: &[u8] = b"mint_limit";
pub const ALLOW_LIST_SEED: &[u8] = b"allow_list";
pub const FREEZE_ESCROW_SEED: &[u8] = b"freeze_escrow";
pub const GATEKEEPER_EXPIRE_SEED: &[u8] = b"expire";
pub const METADATA_SEED: &[u8] = b"metadata";
pub const EDITION_SEED: &[u8] = b"edition";

/// Get the Candy Guard program ID
pub fn candy_guard_program_id() -> Pubkey {
    Pubkey::from_str(CANDY_GUARD_PROGRAM_ID).expect("Invalid Candy Guard program ID")
}

/// Get the Candy Machine Core program ID
pub fn candy_machine_program_id() -> Pubkey {
    Pubkey::from_str(CANDY_MACHINE_PROGRAM_ID).expect("Invalid Candy Machine program ID")
}

/// Get the Token Metadata program ID
pub fn token_metadata_program_id() -> Pubkey {
    Pubkey::from_str(TOKEN_METADATA_PROGRAM_ID).expect("Invalid Token Metadata program ID")
}

/// Get the Civic Gateway program ID
pub fn gateway_program_id() -> Pubkey {
    Pubkey::from_str(GATEWAY_PROGRAM_ID).expect("Invalid Gateway program ID")
}

/// Get the SPL Token program ID
pub fn spl_token_program_id() -> Pubkey {
    Pubkey::from_str(SPL_TOKEN_PROGRAM_ID).expect("Invalid SPL Token program ID")
}
