//! Program derived addresses read by the built-in guards.

use solana_sdk::pubkey::Pubkey;

use crate::constants::{
    gateway_program_id, token_metadata_program_id, ALLOW_LIST_SEED, EDITION_SEED,
    FREEZE_ESCROW_SEED, GATEKEEPER_EXPIRE_SEED, METADATA_SEED, MINT_LIMIT_SEED,
};

/// Counter tracking how many NFTs `user` minted under a `mintLimit` guard
pub fn find_mint_limit_counter(
    id: u8,
    user: &Pubkey,
    candy_guard: &Pubkey,
    candy_machine: &Pubkey,
    program_id: &Pubkey,
) -> Pubkey {
    Pubkey::find_program_address(
        &[
            MINT_LIMIT_SEED,
            &[id],
            user.as_ref(),
            candy_guard.as_ref(),
            candy_machine.as_ref(),
        ],
        program_id,
    )
    .0
}

/// Proof account created by the `allowList` route instruction
pub fn find_allow_list_proof(
    merkle_root: &[u8; 32],
    user: &Pubkey,
    candy_guard: &Pubkey,
    candy_machine: &Pubkey,
    program_id: &Pubkey,
) -> Pubkey {
    Pubkey::find_program_address(
        &[
            ALLOW_LIST_SEED,
            merkle_root.as_ref(),
            user.as_ref(),
            candy_guard.as_ref(),
            candy_machine.as_ref(),
        ],
        program_id,
    )
    .0
}

/// Escrow holding freeze payments until the freeze period ends
pub fn find_freeze_escrow(
    destination: &Pubkey,
    candy_guard: &Pubkey,
    candy_machine: &Pubkey,
    program_id: &Pubkey,
) -> Pubkey {
    Pubkey::find_program_address(
        &[
            FREEZE_ESCROW_SEED,
            destination.as_ref(),
            candy_guard.as_ref(),
            candy_machine.as_ref(),
        ],
        program_id,
    )
    .0
}

pub fn find_gatekeeper_network_expire(gatekeeper_network: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[gatekeeper_network.as_ref(), GATEKEEPER_EXPIRE_SEED],
        &gateway_program_id(),
    )
    .0
}

pub fn find_metadata(mint: &Pubkey) -> Pubkey {
    let program_id = token_metadata_program_id();
    Pubkey::find_program_address(
        &[METADATA_SEED, program_id.as_ref(), mint.as_ref()],
        &program_id,
    )
    .0
}

pub fn find_master_edition(mint: &Pubkey) -> Pubkey {
    let program_id = token_metadata_program_id();
    Pubkey::find_program_address(
        &[METADATA_SEED, program_id.as_ref(), mint.as_ref(), EDITION_SEED],
        &program_id,
    )
    .0
}
