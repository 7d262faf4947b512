//! Turn a configuration into the guard arguments and remaining accounts of
//! a `mint` or `route` instruction.

use log::debug;

use crate::{
    config::{CandyGuardConfiguration, GuardSet},
    guards::{GuardMintSettings, GuardRouteSettings, GuardSettings},
    registry::{CandyGuardProgram, GuardRegistry},
    resolver::resolve_guards,
    types::{CandyGuardError, GuardContext, GuardInstructionArgs},
};

/// Collect the mint contribution of every enabled guard, in program order.
///
/// Guards without a mint parser contribute nothing. `mint_settings` carries
/// the caller input keyed by guard name (NFT to pay with, gateway token...).
/// Every enabled guard and every `mint_settings` key must belong to `program`.
pub fn assemble_mint(
    registry: &GuardRegistry,
    program: &CandyGuardProgram,
    config: &CandyGuardConfiguration,
    group: Option<&str>,
    mint_settings: &GuardSet<GuardMintSettings>,
    context: &GuardContext,
) -> Result<GuardInstructionArgs, CandyGuardError> {
    let effective = resolve_guards(&config.guards, &config.groups, group)?;
    let available = registry.for_program(program)?;
    if let Some(name) = effective
        .names()
        .chain(mint_settings.names())
        .find(|name| !available.iter().any(|guard| guard.name == *name))
    {
        return Err(CandyGuardError::UnregisteredGuard(name.to_string()));
    }

    let mut arguments = Vec::new();
    let mut remaining_accounts = Vec::new();
    for guard in available {
        let Some(settings) = effective.get(&guard.name) else {
            continue;
        };
        let Some(parser) = guard.mint_parser else {
            continue;
        };

        let parsed = parser(settings, mint_settings.get(&guard.name), context)?;
        debug!(
            "Guard `{}` contributed {} argument bytes and {} accounts",
            guard.name,
            parsed.arguments.len(),
            parsed.remaining_accounts.len()
        );
        arguments.extend(parsed.arguments);
        remaining_accounts.extend(parsed.remaining_accounts);
    }

    Ok(GuardInstructionArgs::from_parts(arguments, &remaining_accounts))
}

/// Run the route parser of a single enabled guard
pub fn assemble_route(
    registry: &GuardRegistry,
    program: &CandyGuardProgram,
    config: &CandyGuardConfiguration,
    group: Option<&str>,
    guard_name: &str,
    route_settings: &GuardRouteSettings,
    context: &GuardContext,
) -> Result<GuardInstructionArgs, CandyGuardError> {
    let effective = resolve_guards(&config.guards, &config.groups, group)?;
    let guard = registry
        .for_program(program)?
        .into_iter()
        .find(|guard| guard.name == guard_name)
        .ok_or_else(|| CandyGuardError::UnregisteredGuard(guard_name.to_string()))?;

    let settings: &GuardSettings = effective.get(guard_name).ok_or_else(|| {
        CandyGuardError::GuardNotEnabled {
            name: guard_name.to_string(),
            // a label is only applied when the configuration has groups
            group: group
                .filter(|_| !config.groups.is_empty())
                .map(str::to_string),
        }
    })?;
    let parser = guard
        .route_parser
        .ok_or_else(|| CandyGuardError::RouteNotSupported(guard_name.to_string()))?;

    let parsed = parser(settings, route_settings, context)?;
    debug!(
        "Route for guard `{}`: {} argument bytes, {} accounts",
        guard_name,
        parsed.arguments.len(),
        parsed.remaining_accounts.len()
    );
    Ok(GuardInstructionArgs::from_parts(
        parsed.arguments,
        &parsed.remaining_accounts,
    ))
}
