//! Candy Guard instructions: `initialize`, `update`, `mint` and `route`.
//!
//! Instruction data is the Anchor discriminator followed by the borsh encoded
//! arguments. Guard remaining accounts always come after the fixed accounts.

use borsh::BorshSerialize;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    sysvar,
};

use crate::{
    config::CandyGuardConfiguration,
    constants::{
        candy_machine_program_id, spl_token_program_id, token_metadata_program_id,
        FEATURE_FLAGS_WIDTH,
    },
    discriminator::instruction_discriminator,
    registry::{CandyGuardProgram, GuardRegistry},
    types::{CandyGuardError, GuardInstructionArgs},
};

#[derive(BorshSerialize)]
struct MintArgs<'a> {
    mint_args: &'a [u8],
    label: Option<&'a str>,
}

#[derive(BorshSerialize)]
struct RouteArgs<'a> {
    guard: u8,
    data: &'a [u8],
    label: Option<&'a str>,
}

#[derive(BorshSerialize)]
struct SettingsArgs<'a> {
    data: &'a [u8],
}

fn instruction_data<T: BorshSerialize>(name: &str, args: &T) -> Result<Vec<u8>, CandyGuardError> {
    let mut data = instruction_discriminator(name).to_vec();
    args.serialize(&mut data)
        .map_err(|e| CandyGuardError::InstructionEncoding(e.to_string()))?;
    Ok(data)
}

/// `mint` data: discriminator, guard arguments and the selected group
pub fn mint_instruction_data(
    arguments: &[u8],
    label: Option<&str>,
) -> Result<Vec<u8>, CandyGuardError> {
    instruction_data(
        "mint",
        &MintArgs {
            mint_args: arguments,
            label,
        },
    )
}

/// `route` data: discriminator, guard index, route arguments and the group
pub fn route_instruction_data(
    guard_index: u8,
    arguments: &[u8],
    label: Option<&str>,
) -> Result<Vec<u8>, CandyGuardError> {
    instruction_data(
        "route",
        &RouteArgs {
            guard: guard_index,
            data: arguments,
            label,
        },
    )
}

pub fn initialize_instruction_data(settings: &[u8]) -> Result<Vec<u8>, CandyGuardError> {
    instruction_data("initialize", &SettingsArgs { data: settings })
}

pub fn update_instruction_data(settings: &[u8]) -> Result<Vec<u8>, CandyGuardError> {
    instruction_data("update", &SettingsArgs { data: settings })
}

/// Fixed accounts of the `mint` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintAccounts {
    pub candy_guard: Pubkey,
    pub candy_machine_program: Pubkey,
    pub candy_machine: Pubkey,
    pub candy_machine_authority_pda: Pubkey,
    pub payer: Pubkey,
    pub nft_mint: Pubkey,
    pub nft_mint_authority: Pubkey,
    pub nft_metadata: Pubkey,
    pub nft_master_edition: Pubkey,
    pub collection_authority_record: Pubkey,
    pub collection_mint: Pubkey,
    pub collection_metadata: Pubkey,
    pub collection_master_edition: Pubkey,
    pub collection_update_authority: Pubkey,
    pub token_metadata_program: Pubkey,
    pub token_program: Pubkey,
    pub system_program: Pubkey,
    pub recent_slothashes: Pubkey,
    pub instruction_sysvar_account: Pubkey,
}

impl MintAccounts {
    /// Accounts with the well-known programs and sysvars filled in
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        candy_guard: Pubkey,
        candy_machine: Pubkey,
        candy_machine_authority_pda: Pubkey,
        payer: Pubkey,
        nft_mint: Pubkey,
        nft_metadata: Pubkey,
        nft_master_edition: Pubkey,
        collection_authority_record: Pubkey,
        collection_mint: Pubkey,
        collection_metadata: Pubkey,
        collection_master_edition: Pubkey,
        collection_update_authority: Pubkey,
    ) -> Self {
        Self {
            candy_guard,
            candy_machine_program: candy_machine_program_id(),
            candy_machine,
            candy_machine_authority_pda,
            payer,
            nft_mint,
            nft_mint_authority: payer,
            nft_metadata,
            nft_master_edition,
            collection_authority_record,
            collection_mint,
            collection_metadata,
            collection_master_edition,
            collection_update_authority,
            token_metadata_program: token_metadata_program_id(),
            token_program: spl_token_program_id(),
            system_program: solana_system_interface::program::id(),
            recent_slothashes: sysvar::slot_hashes::id(),
            instruction_sysvar_account: sysvar::instructions::id(),
        }
    }
}

impl From<MintAccounts> for Vec<AccountMeta> {
    fn from(accounts: MintAccounts) -> Self {
        vec![
            AccountMeta::new_readonly(accounts.candy_guard, false),
            AccountMeta::new_readonly(accounts.candy_machine_program, false),
            AccountMeta::new(accounts.candy_machine, false),
            AccountMeta::new(accounts.candy_machine_authority_pda, false),
            AccountMeta::new(accounts.payer, true),
            AccountMeta::new(accounts.nft_mint, true),
            AccountMeta::new_readonly(accounts.nft_mint_authority, true),
            AccountMeta::new(accounts.nft_metadata, false),
            AccountMeta::new(accounts.nft_master_edition, false),
            AccountMeta::new_readonly(accounts.collection_authority_record, false),
            AccountMeta::new_readonly(accounts.collection_mint, false),
            AccountMeta::new(accounts.collection_metadata, false),
            AccountMeta::new_readonly(accounts.collection_master_edition, false),
            AccountMeta::new_readonly(accounts.collection_update_authority, false),
            AccountMeta::new_readonly(accounts.token_metadata_program, false),
            AccountMeta::new_readonly(accounts.token_program, false),
            AccountMeta::new_readonly(accounts.system_program, false),
            AccountMeta::new_readonly(accounts.recent_slothashes, false),
            AccountMeta::new_readonly(accounts.instruction_sysvar_account, false),
        ]
    }
}

/// Fixed accounts of the `route` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteAccounts {
    pub candy_guard: Pubkey,
    pub candy_machine: Pubkey,
    pub payer: Pubkey,
}

impl From<RouteAccounts> for Vec<AccountMeta> {
    fn from(accounts: RouteAccounts) -> Self {
        vec![
            AccountMeta::new_readonly(accounts.candy_guard, false),
            AccountMeta::new(accounts.candy_machine, false),
            AccountMeta::new(accounts.payer, true),
        ]
    }
}

/// Fixed accounts of the `initialize` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeAccounts {
    pub candy_guard: Pubkey,
    pub base: Pubkey,
    pub authority: Pubkey,
    pub payer: Pubkey,
    pub system_program: Pubkey,
}

impl From<InitializeAccounts> for Vec<AccountMeta> {
    fn from(accounts: InitializeAccounts) -> Self {
        vec![
            AccountMeta::new(accounts.candy_guard, false),
            AccountMeta::new_readonly(accounts.base, true),
            AccountMeta::new_readonly(accounts.authority, false),
            AccountMeta::new(accounts.payer, true),
            AccountMeta::new_readonly(accounts.system_program, false),
        ]
    }
}

/// Fixed accounts of the `update` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateAccounts {
    pub candy_guard: Pubkey,
    pub authority: Pubkey,
    pub payer: Pubkey,
    pub system_program: Pubkey,
}

impl From<UpdateAccounts> for Vec<AccountMeta> {
    fn from(accounts: UpdateAccounts) -> Self {
        vec![
            AccountMeta::new(accounts.candy_guard, false),
            AccountMeta::new_readonly(accounts.authority, true),
            AccountMeta::new(accounts.payer, true),
            AccountMeta::new_readonly(accounts.system_program, false),
        ]
    }
}

impl GuardInstructionArgs {
    /// Wrap into an instruction, appending the guard accounts after `accounts`
    pub fn into_instruction(
        self,
        program_id: Pubkey,
        mut accounts: Vec<AccountMeta>,
        data: Vec<u8>,
    ) -> Instruction {
        accounts.extend(self.accounts);
        Instruction {
            program_id,
            accounts,
            data,
        }
    }
}

/// Build a `mint` instruction from assembled guard arguments
pub fn build_mint_instruction(
    program: &CandyGuardProgram,
    accounts: MintAccounts,
    args: GuardInstructionArgs,
    group: Option<&str>,
) -> Result<Instruction, CandyGuardError> {
    let data = mint_instruction_data(&args.arguments, group)?;
    Ok(args.into_instruction(program.address, accounts.into(), data))
}

/// Build a `route` instruction targeting `guard_name`
pub fn build_route_instruction(
    program: &CandyGuardProgram,
    accounts: RouteAccounts,
    guard_name: &str,
    args: GuardInstructionArgs,
    group: Option<&str>,
) -> Result<Instruction, CandyGuardError> {
    let overflow = || CandyGuardError::FeatureFlagOverflow {
        count: program.guards.len(),
        max: FEATURE_FLAGS_WIDTH,
    };
    if program.guards.len() > FEATURE_FLAGS_WIDTH {
        return Err(overflow());
    }
    let guard_index = program
        .guard_index(guard_name)
        .ok_or_else(|| CandyGuardError::UnregisteredGuard(guard_name.to_string()))?;
    let guard_index = u8::try_from(guard_index).map_err(|_| overflow())?;
    let data = route_instruction_data(guard_index, &args.arguments, group)?;
    Ok(args.into_instruction(program.address, accounts.into(), data))
}

pub fn build_initialize_instruction(
    registry: &GuardRegistry,
    program: &CandyGuardProgram,
    accounts: InitializeAccounts,
    config: &CandyGuardConfiguration,
) -> Result<Instruction, CandyGuardError> {
    let data = initialize_instruction_data(&config.to_bytes(registry, program)?)?;
    Ok(Instruction {
        program_id: program.address,
        accounts: accounts.into(),
        data,
    })
}

pub fn build_update_instruction(
    registry: &GuardRegistry,
    program: &CandyGuardProgram,
    accounts: UpdateAccounts,
    config: &CandyGuardConfiguration,
) -> Result<Instruction, CandyGuardError> {
    let data = update_instruction_data(&config.to_bytes(registry, program)?)?;
    Ok(Instruction {
        program_id: program.address,
        accounts: accounts.into(),
        data,
    })
}
