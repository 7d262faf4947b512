//! Mint and route parsers for the built-in guards.
//!
//! A parser turns a guard's settings (plus any caller input) into the
//! argument bytes and remaining accounts the on-chain guard reads. Account
//! order inside a parser follows the order the on-chain guard consumes them.

use solana_sdk::{pubkey::Pubkey, sysvar};
use solana_system_interface::program as system_program;
use spl_associated_token_account::get_associated_token_address;

use crate::{
    constants::{gateway_program_id, spl_token_program_id, token_metadata_program_id},
    guards::{
        AllowList, BuiltinGuard, FreezeInstruction, FreezeSolPayment, FreezeTokenPayment,
        Gatekeeper, GuardMintSettings, GuardRouteSettings, GuardSettings, MintLimit,
        NftBurn, NftMintSettings, NftPayment, SolPayment, ThirdPartySigner, TokenBurn,
        TokenGate, TokenPayment,
    },
    pda::{
        find_allow_list_proof, find_freeze_escrow, find_gatekeeper_network_expire,
        find_master_edition, find_metadata, find_mint_limit_counter,
    },
    types::{CandyGuardError, GuardContext, ParsedGuardArgs, RemainingAccount},
};

fn settings_for<G: BuiltinGuard>(settings: &GuardSettings) -> Result<&G, CandyGuardError> {
    G::from_settings(settings).ok_or_else(|| CandyGuardError::SettingsMismatch {
        guard: G::NAME.to_string(),
        found: settings.kind().to_string(),
    })
}

fn nft_mint_settings<'a>(
    guard: &str,
    mint_settings: Option<&'a GuardMintSettings>,
) -> Result<&'a NftMintSettings, CandyGuardError> {
    match (guard, mint_settings) {
        ("nftPayment", Some(GuardMintSettings::NftPayment(nft)))
        | ("nftGate", Some(GuardMintSettings::NftGate(nft)))
        | ("nftBurn", Some(GuardMintSettings::NftBurn(nft))) => Ok(nft),
        _ => Err(CandyGuardError::MissingMintSettings(guard.to_string())),
    }
}

fn nft_token_account(nft: &NftMintSettings, owner: &Pubkey) -> Pubkey {
    nft.token_account
        .unwrap_or_else(|| get_associated_token_address(owner, &nft.mint))
}

pub fn sol_payment_mint(
    settings: &GuardSettings,
    _mint_settings: Option<&GuardMintSettings>,
    _context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<SolPayment>(settings)?;
    Ok(ParsedGuardArgs::accounts(vec![RemainingAccount::writable(
        settings.destination,
    )]))
}

pub fn token_payment_mint(
    settings: &GuardSettings,
    _mint_settings: Option<&GuardMintSettings>,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<TokenPayment>(settings)?;
    Ok(ParsedGuardArgs::accounts(vec![
        RemainingAccount::writable(get_associated_token_address(&context.payer, &settings.mint)),
        RemainingAccount::writable(settings.destination_ata),
    ]))
}

pub fn third_party_signer_mint(
    settings: &GuardSettings,
    _mint_settings: Option<&GuardMintSettings>,
    _context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<ThirdPartySigner>(settings)?;
    Ok(ParsedGuardArgs::accounts(vec![RemainingAccount::signer(
        settings.signer_key,
    )]))
}

pub fn token_gate_mint(
    settings: &GuardSettings,
    _mint_settings: Option<&GuardMintSettings>,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<TokenGate>(settings)?;
    Ok(ParsedGuardArgs::accounts(vec![RemainingAccount::readonly(
        get_associated_token_address(&context.payer, &settings.mint),
    )]))
}

pub fn gatekeeper_mint(
    settings: &GuardSettings,
    mint_settings: Option<&GuardMintSettings>,
    _context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<Gatekeeper>(settings)?;
    let token_account = match mint_settings {
        Some(GuardMintSettings::Gatekeeper { token_account }) => *token_account,
        _ => return Err(CandyGuardError::MissingMintSettings(Gatekeeper::NAME.to_string())),
    };

    let mut accounts = vec![RemainingAccount::writable(token_account)];
    if settings.expire_on_use {
        accounts.push(RemainingAccount::readonly(gateway_program_id()));
        accounts.push(RemainingAccount::readonly(find_gatekeeper_network_expire(
            &settings.gatekeeper_network,
        )));
    }
    Ok(ParsedGuardArgs::accounts(accounts))
}

pub fn allow_list_mint(
    settings: &GuardSettings,
    _mint_settings: Option<&GuardMintSettings>,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<AllowList>(settings)?;
    let proof = find_allow_list_proof(
        &settings.merkle_root,
        &context.minter,
        &context.candy_guard,
        &context.candy_machine,
        &context.program_id,
    );
    Ok(ParsedGuardArgs::accounts(vec![RemainingAccount::readonly(proof)]))
}

pub fn mint_limit_mint(
    settings: &GuardSettings,
    _mint_settings: Option<&GuardMintSettings>,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<MintLimit>(settings)?;
    let counter = find_mint_limit_counter(
        settings.id,
        &context.minter,
        &context.candy_guard,
        &context.candy_machine,
        &context.program_id,
    );
    Ok(ParsedGuardArgs::accounts(vec![RemainingAccount::writable(counter)]))
}

pub fn nft_payment_mint(
    settings: &GuardSettings,
    mint_settings: Option<&GuardMintSettings>,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<NftPayment>(settings)?;
    let nft = nft_mint_settings(NftPayment::NAME, mint_settings)?;

    Ok(ParsedGuardArgs::accounts(vec![
        RemainingAccount::writable(nft_token_account(nft, &context.minter)),
        RemainingAccount::readonly(find_metadata(&nft.mint)),
        RemainingAccount::readonly(nft.mint),
        RemainingAccount::readonly(settings.destination),
        RemainingAccount::writable(get_associated_token_address(
            &settings.destination,
            &nft.mint,
        )),
        RemainingAccount::readonly(spl_associated_token_account::id()),
    ]))
}

pub fn nft_gate_mint(
    _settings: &GuardSettings,
    mint_settings: Option<&GuardMintSettings>,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let nft = nft_mint_settings("nftGate", mint_settings)?;
    Ok(ParsedGuardArgs::accounts(vec![
        RemainingAccount::readonly(nft_token_account(nft, &context.minter)),
        RemainingAccount::readonly(find_metadata(&nft.mint)),
    ]))
}

pub fn nft_burn_mint(
    settings: &GuardSettings,
    mint_settings: Option<&GuardMintSettings>,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<NftBurn>(settings)?;
    let nft = nft_mint_settings(NftBurn::NAME, mint_settings)?;

    Ok(ParsedGuardArgs::accounts(vec![
        RemainingAccount::writable(nft_token_account(nft, &context.minter)),
        RemainingAccount::writable(find_metadata(&nft.mint)),
        RemainingAccount::writable(find_master_edition(&nft.mint)),
        RemainingAccount::writable(nft.mint),
        RemainingAccount::writable(find_metadata(&settings.required_collection)),
    ]))
}

pub fn token_burn_mint(
    settings: &GuardSettings,
    _mint_settings: Option<&GuardMintSettings>,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<TokenBurn>(settings)?;
    Ok(ParsedGuardArgs::accounts(vec![
        RemainingAccount::writable(get_associated_token_address(&context.payer, &settings.mint)),
        RemainingAccount::writable(settings.mint),
    ]))
}

pub fn freeze_sol_payment_mint(
    settings: &GuardSettings,
    _mint_settings: Option<&GuardMintSettings>,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<FreezeSolPayment>(settings)?;
    let freeze_escrow = find_freeze_escrow(
        &settings.destination,
        &context.candy_guard,
        &context.candy_machine,
        &context.program_id,
    );
    Ok(ParsedGuardArgs::accounts(vec![
        RemainingAccount::writable(freeze_escrow),
        RemainingAccount::readonly(get_associated_token_address(
            &context.minter,
            &context.nft_mint,
        )),
    ]))
}

pub fn freeze_token_payment_mint(
    settings: &GuardSettings,
    _mint_settings: Option<&GuardMintSettings>,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<FreezeTokenPayment>(settings)?;
    let freeze_escrow = find_freeze_escrow(
        &settings.destination_ata,
        &context.candy_guard,
        &context.candy_machine,
        &context.program_id,
    );
    Ok(ParsedGuardArgs::accounts(vec![
        RemainingAccount::writable(freeze_escrow),
        RemainingAccount::readonly(get_associated_token_address(
            &context.minter,
            &context.nft_mint,
        )),
        RemainingAccount::writable(get_associated_token_address(&context.payer, &settings.mint)),
        RemainingAccount::writable(get_associated_token_address(&freeze_escrow, &settings.mint)),
    ]))
}

pub fn program_gate_mint(
    _settings: &GuardSettings,
    _mint_settings: Option<&GuardMintSettings>,
    _context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    Ok(ParsedGuardArgs::accounts(vec![RemainingAccount::readonly(
        sysvar::instructions::id(),
    )]))
}

/// Pass-through parser for custom guards fed pre-encoded mint input
pub fn custom_mint(
    _settings: &GuardSettings,
    mint_settings: Option<&GuardMintSettings>,
    _context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    match mint_settings {
        Some(GuardMintSettings::Custom {
            data,
            remaining_accounts,
        }) => Ok(ParsedGuardArgs {
            arguments: data.clone(),
            remaining_accounts: remaining_accounts.clone(),
        }),
        _ => Ok(ParsedGuardArgs::default()),
    }
}

fn unexpected_route(guard: &str) -> CandyGuardError {
    CandyGuardError::InvalidGuardSettings {
        guard: guard.to_string(),
        reason: "route settings belong to another guard".to_string(),
    }
}

pub fn allow_list_route(
    settings: &GuardSettings,
    route_settings: &GuardRouteSettings,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<AllowList>(settings)?;
    let merkle_proof = match route_settings {
        GuardRouteSettings::AllowList { merkle_proof } => merkle_proof,
        _ => return Err(unexpected_route(AllowList::NAME)),
    };

    // borsh Vec<[u8; 32]>
    let mut arguments = Vec::with_capacity(4 + merkle_proof.len() * 32);
    arguments.extend_from_slice(&(merkle_proof.len() as u32).to_le_bytes());
    for node in merkle_proof {
        arguments.extend_from_slice(node);
    }

    let proof = find_allow_list_proof(
        &settings.merkle_root,
        &context.minter,
        &context.candy_guard,
        &context.candy_machine,
        &context.program_id,
    );

    Ok(ParsedGuardArgs {
        arguments,
        remaining_accounts: vec![
            RemainingAccount::writable(proof),
            RemainingAccount::readonly(system_program::id()),
        ],
    })
}

fn freeze_arguments(instruction: &FreezeInstruction) -> Vec<u8> {
    let mut arguments = vec![instruction.index()];
    if let FreezeInstruction::Initialize { period, .. } = instruction {
        arguments.extend_from_slice(&period.to_le_bytes());
    }
    arguments
}

fn thaw_accounts(freeze_escrow: Pubkey, nft_mint: &Pubkey, nft_owner: &Pubkey) -> Vec<RemainingAccount> {
    vec![
        RemainingAccount::writable(freeze_escrow),
        RemainingAccount::readonly(*nft_mint),
        RemainingAccount::readonly(*nft_owner),
        RemainingAccount::writable(get_associated_token_address(nft_owner, nft_mint)),
        RemainingAccount::readonly(find_master_edition(nft_mint)),
        RemainingAccount::readonly(spl_token_program_id()),
        RemainingAccount::readonly(token_metadata_program_id()),
    ]
}

pub fn freeze_sol_payment_route(
    settings: &GuardSettings,
    route_settings: &GuardRouteSettings,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<FreezeSolPayment>(settings)?;
    let instruction = match route_settings {
        GuardRouteSettings::Freeze(instruction) => instruction,
        _ => return Err(unexpected_route(FreezeSolPayment::NAME)),
    };
    let freeze_escrow = find_freeze_escrow(
        &settings.destination,
        &context.candy_guard,
        &context.candy_machine,
        &context.program_id,
    );

    let remaining_accounts = match instruction {
        FreezeInstruction::Initialize {
            candy_guard_authority,
            ..
        } => vec![
            RemainingAccount::writable(freeze_escrow),
            RemainingAccount::signer(*candy_guard_authority),
            RemainingAccount::readonly(system_program::id()),
        ],
        FreezeInstruction::Thaw {
            nft_mint,
            nft_owner,
        } => thaw_accounts(freeze_escrow, nft_mint, nft_owner),
        FreezeInstruction::UnlockFunds {
            candy_guard_authority,
        } => vec![
            RemainingAccount::writable(freeze_escrow),
            RemainingAccount::signer(*candy_guard_authority),
            RemainingAccount::writable(settings.destination),
            RemainingAccount::readonly(system_program::id()),
        ],
    };

    Ok(ParsedGuardArgs {
        arguments: freeze_arguments(instruction),
        remaining_accounts,
    })
}

pub fn freeze_token_payment_route(
    settings: &GuardSettings,
    route_settings: &GuardRouteSettings,
    context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    let settings = settings_for::<FreezeTokenPayment>(settings)?;
    let instruction = match route_settings {
        GuardRouteSettings::Freeze(instruction) => instruction,
        _ => return Err(unexpected_route(FreezeTokenPayment::NAME)),
    };
    let freeze_escrow = find_freeze_escrow(
        &settings.destination_ata,
        &context.candy_guard,
        &context.candy_machine,
        &context.program_id,
    );
    let escrow_ata = get_associated_token_address(&freeze_escrow, &settings.mint);

    let remaining_accounts = match instruction {
        FreezeInstruction::Initialize {
            candy_guard_authority,
            ..
        } => vec![
            RemainingAccount::writable(freeze_escrow),
            RemainingAccount::signer(*candy_guard_authority),
            RemainingAccount::readonly(system_program::id()),
            RemainingAccount::writable(escrow_ata),
            RemainingAccount::readonly(settings.mint),
            RemainingAccount::readonly(spl_token_program_id()),
            RemainingAccount::readonly(spl_associated_token_account::id()),
            RemainingAccount::readonly(settings.destination_ata),
        ],
        FreezeInstruction::Thaw {
            nft_mint,
            nft_owner,
        } => thaw_accounts(freeze_escrow, nft_mint, nft_owner),
        FreezeInstruction::UnlockFunds {
            candy_guard_authority,
        } => vec![
            RemainingAccount::writable(freeze_escrow),
            RemainingAccount::signer(*candy_guard_authority),
            RemainingAccount::writable(escrow_ata),
            RemainingAccount::writable(settings.destination_ata),
            RemainingAccount::readonly(spl_token_program_id()),
            RemainingAccount::readonly(system_program::id()),
        ],
    };

    Ok(ParsedGuardArgs {
        arguments: freeze_arguments(instruction),
        remaining_accounts,
    })
}

/// Pass-through parser for custom guards fed pre-encoded route input
pub fn custom_route(
    _settings: &GuardSettings,
    route_settings: &GuardRouteSettings,
    _context: &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError> {
    match route_settings {
        GuardRouteSettings::Custom {
            data,
            remaining_accounts,
        } => Ok(ParsedGuardArgs {
            arguments: data.clone(),
            remaining_accounts: remaining_accounts.clone(),
        }),
        _ => Err(CandyGuardError::InvalidGuardSettings {
            guard: "custom".to_string(),
            reason: "expected custom route settings".to_string(),
        }),
    }
}
