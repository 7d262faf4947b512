//! Guard descriptors and the ordered registry that resolves them by name.
//!
//! The registry is an append-only table populated at startup: the built-in
//! guards first, then any custom guards. Lookups never mutate it, so a fully
//! populated registry can be shared freely between threads.

use log::debug;
use solana_sdk::pubkey::Pubkey;

use crate::{
    constants::{candy_guard_program_id, DEFAULT_GUARD_NAMES, FEATURE_FLAGS_WIDTH},
    guards::{
        AddressGate, AllowList, BotTax, BuiltinGuard, EndDate, FreezeSolPayment,
        FreezeTokenPayment, Gatekeeper, GuardMintSettings, GuardRouteSettings, GuardSettings,
        MintLimit, NftBurn, NftGate, NftPayment, ProgramGate, RedeemedAmount, SolPayment,
        StartDate, ThirdPartySigner, TokenBurn, TokenGate, TokenPayment,
    },
    parser,
    types::{CandyGuardError, GuardContext, ParsedGuardArgs},
};

pub type SerializeFn = fn(&str, &GuardSettings) -> Result<Vec<u8>, CandyGuardError>;
pub type DeserializeFn = fn(&str, &[u8]) -> Result<GuardSettings, CandyGuardError>;
pub type JsonDecodeFn = fn(&str, serde_json::Value) -> Result<GuardSettings, CandyGuardError>;
pub type MintParser = fn(
    &GuardSettings,
    Option<&GuardMintSettings>,
    &GuardContext,
) -> Result<ParsedGuardArgs, CandyGuardError>;
pub type RouteParser =
    fn(&GuardSettings, &GuardRouteSettings, &GuardContext) -> Result<ParsedGuardArgs, CandyGuardError>;

/// Everything needed to encode, decode and assemble one guard
#[derive(Clone)]
pub struct GuardDescriptor {
    pub name: String,
    /// Constant serialized size of one settings value
    pub byte_width: usize,
    pub serialize: SerializeFn,
    pub deserialize: DeserializeFn,
    pub decode_json: JsonDecodeFn,
    pub mint_parser: Option<MintParser>,
    pub route_parser: Option<RouteParser>,
}

fn serialize_builtin<G: BuiltinGuard>(
    name: &str,
    settings: &GuardSettings,
) -> Result<Vec<u8>, CandyGuardError> {
    let settings = G::from_settings(settings).ok_or_else(|| CandyGuardError::SettingsMismatch {
        guard: name.to_string(),
        found: settings.kind().to_string(),
    })?;
    borsh::to_vec(settings).map_err(|e| CandyGuardError::InvalidGuardSettings {
        guard: name.to_string(),
        reason: e.to_string(),
    })
}

fn deserialize_builtin<G: BuiltinGuard>(
    name: &str,
    bytes: &[u8],
) -> Result<GuardSettings, CandyGuardError> {
    G::try_from_slice(bytes)
        .map(G::into_settings)
        .map_err(|e| CandyGuardError::InvalidGuardSettings {
            guard: name.to_string(),
            reason: e.to_string(),
        })
}

fn decode_builtin_json<G: BuiltinGuard>(
    name: &str,
    value: serde_json::Value,
) -> Result<GuardSettings, CandyGuardError> {
    serde_json::from_value::<G>(value)
        .map(G::into_settings)
        .map_err(|e| CandyGuardError::InvalidGuardSettings {
            guard: name.to_string(),
            reason: e.to_string(),
        })
}

fn serialize_custom(name: &str, settings: &GuardSettings) -> Result<Vec<u8>, CandyGuardError> {
    match settings {
        GuardSettings::Custom(bytes) => Ok(bytes.clone()),
        other => Err(CandyGuardError::SettingsMismatch {
            guard: name.to_string(),
            found: other.kind().to_string(),
        }),
    }
}

fn deserialize_custom(_name: &str, bytes: &[u8]) -> Result<GuardSettings, CandyGuardError> {
    Ok(GuardSettings::Custom(bytes.to_vec()))
}

fn decode_custom_json(
    name: &str,
    value: serde_json::Value,
) -> Result<GuardSettings, CandyGuardError> {
    serde_json::from_value::<Vec<u8>>(value)
        .map(GuardSettings::Custom)
        .map_err(|e| CandyGuardError::InvalidGuardSettings {
            guard: name.to_string(),
            reason: e.to_string(),
        })
}

impl std::fmt::Debug for GuardDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardDescriptor")
            .field("name", &self.name)
            .field("byte_width", &self.byte_width)
            .field("mint_parser", &self.mint_parser.is_some())
            .field("route_parser", &self.route_parser.is_some())
            .finish()
    }
}

impl GuardDescriptor {
    /// Descriptor for a guard whose settings layout is known to this crate
    pub fn builtin<G: BuiltinGuard>() -> Self {
        Self {
            name: G::NAME.to_string(),
            byte_width: G::BYTE_WIDTH,
            serialize: serialize_builtin::<G>,
            deserialize: deserialize_builtin::<G>,
            decode_json: decode_builtin_json::<G>,
            mint_parser: None,
            route_parser: None,
        }
    }

    /// Descriptor for a guard whose settings are opaque fixed-width bytes
    pub fn custom(name: impl Into<String>, byte_width: usize) -> Self {
        Self {
            name: name.into(),
            byte_width,
            serialize: serialize_custom,
            deserialize: deserialize_custom,
            decode_json: decode_custom_json,
            mint_parser: None,
            route_parser: None,
        }
    }

    pub fn with_mint_parser(mut self, parser: MintParser) -> Self {
        self.mint_parser = Some(parser);
        self
    }

    pub fn with_route_parser(mut self, parser: RouteParser) -> Self {
        self.route_parser = Some(parser);
        self
    }

    /// Serialize settings, checking the output has the declared width
    pub fn serialize_settings(&self, settings: &GuardSettings) -> Result<Vec<u8>, CandyGuardError> {
        let bytes = (self.serialize)(&self.name, settings)?;
        if bytes.len() != self.byte_width {
            return Err(CandyGuardError::SettingsSizeMismatch {
                guard: self.name.clone(),
                expected: self.byte_width,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }

    /// Deserialize exactly `byte_width` bytes into settings
    pub fn deserialize_settings(&self, bytes: &[u8]) -> Result<GuardSettings, CandyGuardError> {
        if bytes.len() != self.byte_width {
            return Err(CandyGuardError::SettingsSizeMismatch {
                guard: self.name.clone(),
                expected: self.byte_width,
                actual: bytes.len(),
            });
        }
        (self.deserialize)(&self.name, bytes)
    }

    pub fn settings_from_json(&self, value: serde_json::Value) -> Result<GuardSettings, CandyGuardError> {
        (self.decode_json)(&self.name, value)
    }
}

/// A deployed Candy Guard program and the guard order compiled into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandyGuardProgram {
    pub address: Pubkey,
    pub guards: Vec<String>,
}

impl Default for CandyGuardProgram {
    fn default() -> Self {
        Self {
            address: candy_guard_program_id(),
            guards: DEFAULT_GUARD_NAMES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl CandyGuardProgram {
    pub fn new<I, S>(address: Pubkey, guards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            address,
            guards: guards.into_iter().map(Into::into).collect(),
        }
    }

    /// Position of a guard in the program's order, used as its `GuardType`
    pub fn guard_index(&self, name: &str) -> Option<usize> {
        self.guards.iter().position(|guard| guard == name)
    }
}

/// Ordered table of guard descriptors
#[derive(Debug, Clone, Default)]
pub struct GuardRegistry {
    guards: Vec<GuardDescriptor>,
}

impl GuardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every guard compiled into the default program
    pub fn with_default_guards() -> Self {
        let mut registry = Self::new();
        let builtins = [
            GuardDescriptor::builtin::<BotTax>(),
            GuardDescriptor::builtin::<SolPayment>().with_mint_parser(parser::sol_payment_mint),
            GuardDescriptor::builtin::<TokenPayment>().with_mint_parser(parser::token_payment_mint),
            GuardDescriptor::builtin::<StartDate>(),
            GuardDescriptor::builtin::<ThirdPartySigner>()
                .with_mint_parser(parser::third_party_signer_mint),
            GuardDescriptor::builtin::<TokenGate>().with_mint_parser(parser::token_gate_mint),
            GuardDescriptor::builtin::<Gatekeeper>().with_mint_parser(parser::gatekeeper_mint),
            GuardDescriptor::builtin::<EndDate>(),
            GuardDescriptor::builtin::<AllowList>()
                .with_mint_parser(parser::allow_list_mint)
                .with_route_parser(parser::allow_list_route),
            GuardDescriptor::builtin::<MintLimit>().with_mint_parser(parser::mint_limit_mint),
            GuardDescriptor::builtin::<NftPayment>().with_mint_parser(parser::nft_payment_mint),
            GuardDescriptor::builtin::<RedeemedAmount>(),
            GuardDescriptor::builtin::<AddressGate>(),
            GuardDescriptor::builtin::<NftGate>().with_mint_parser(parser::nft_gate_mint),
            GuardDescriptor::builtin::<NftBurn>().with_mint_parser(parser::nft_burn_mint),
            GuardDescriptor::builtin::<TokenBurn>().with_mint_parser(parser::token_burn_mint),
            GuardDescriptor::builtin::<FreezeSolPayment>()
                .with_mint_parser(parser::freeze_sol_payment_mint)
                .with_route_parser(parser::freeze_sol_payment_route),
            GuardDescriptor::builtin::<FreezeTokenPayment>()
                .with_mint_parser(parser::freeze_token_payment_mint)
                .with_route_parser(parser::freeze_token_payment_route),
            GuardDescriptor::builtin::<ProgramGate>().with_mint_parser(parser::program_gate_mint),
        ];
        registry.guards.extend(builtins);
        registry
    }

    /// Append a descriptor. Registration order should follow the program's
    /// compiled guard order.
    pub fn register(&mut self, descriptor: GuardDescriptor) -> Result<(), CandyGuardError> {
        if self.guards.iter().any(|guard| guard.name == descriptor.name) {
            return Err(CandyGuardError::DuplicateGuard(descriptor.name));
        }
        debug!(
            "Registering guard `{}` ({} bytes) at position {}",
            descriptor.name,
            descriptor.byte_width,
            self.guards.len()
        );
        self.guards.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&GuardDescriptor, CandyGuardError> {
        self.guards
            .iter()
            .find(|guard| guard.name == name)
            .ok_or_else(|| CandyGuardError::UnregisteredGuard(name.to_string()))
    }

    /// Descriptors for a program's guards, in the program's order
    pub fn for_program(
        &self,
        program: &CandyGuardProgram,
    ) -> Result<Vec<&GuardDescriptor>, CandyGuardError> {
        if program.guards.len() > FEATURE_FLAGS_WIDTH {
            return Err(CandyGuardError::FeatureFlagOverflow {
                count: program.guards.len(),
                max: FEATURE_FLAGS_WIDTH,
            });
        }
        program.guards.iter().map(|name| self.get(name)).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.guards.iter().map(|guard| guard.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}
