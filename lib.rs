//! # Candy Guard Codec
//!
//! A Rust library for encoding and decoding Metaplex Candy Guard configurations
//! and assembling the guard payload of `mint` and `route` instructions.
//!
//! ## Problem
//!
//! A Candy Guard account stores a dynamically composed set of guards (mint
//! preconditions) in a compact binary format with no per-guard framing. The
//! byte layout depends on the guard order compiled into the target program, so
//! a single misplaced byte silently corrupts an instruction.
//!
//! ## Solution
//!
//! This crate provides functionality to:
//! 1. **Register** guard descriptors in the program's order ([`GuardRegistry`])
//! 2. **Encode/decode** guard sets and groups ([`CandyGuardConfiguration`])
//! 3. **Resolve** the effective guards for a group ([`resolve_guards`])
//! 4. **Assemble** mint and route arguments and accounts ([`assemble_mint`], [`assemble_route`])
//!
//! ## Usage
//!
//! ```ignore
//! use candy_guard_codec::{
//!     assemble_mint, build_mint_instruction, CandyGuardAccount, CandyGuardProgram,
//!     GuardRegistry, GuardSet,
//! };
//!
//! let registry = GuardRegistry::with_default_guards();
//! let program = CandyGuardProgram::default();
//!
//! let account = CandyGuardAccount::from_base64(&rpc_data, &registry, &program)?;
//! let args = assemble_mint(
//!     &registry,
//!     &program,
//!     &account.configuration,
//!     Some("public"),
//!     &GuardSet::new(),
//!     &context,
//! )?;
//! let ix = build_mint_instruction(&program, mint_accounts, args, Some("public"))?;
//! ```
//!
//! ## Wire Format
//!
//! A guard set is 8 feature flag bytes followed by the settings of every
//! enabled guard, in program order. The configuration is the default guard set,
//! a little-endian `u32` group count, then for each group a 6-byte
//! space-padded label and its guard set.
//!
//! ## Important Notes
//!
//! - Registration order must match the order compiled into the program
//! - Every guard serializes to a constant number of bytes
//! - Custom guards register with [`GuardDescriptor::custom`]

pub mod assembler;
pub mod codec;
pub mod config;
pub mod constants;
pub mod discriminator;
pub mod feature_flags;
pub mod guards;
pub mod instruction;
pub mod parser;
pub mod pda;
pub mod registry;
pub mod resolver;
pub mod state;
pub mod types;

// Re-export main public API
pub use assembler::{assemble_mint, assemble_route};
pub use codec::{deserialize_guard_settings, serialize_guard_set, serialize_guard_settings};
pub use config::{CandyGuardConfiguration, GuardGroup, GuardSet};
pub use constants::{
    candy_guard_program_id, candy_machine_program_id, CANDY_GUARD_PROGRAM_ID,
    DEFAULT_GUARD_NAMES, FEATURE_FLAGS_SIZE, GROUP_LABEL_SIZE,
};
pub use discriminator::{account_discriminator, instruction_discriminator};
pub use feature_flags::FeatureFlags;
pub use guards::{
    BuiltinGuard, FreezeInstruction, GuardMintSettings, GuardRouteSettings, GuardSettings,
    NftMintSettings,
};
pub use instruction::{
    build_initialize_instruction, build_mint_instruction, build_route_instruction,
    build_update_instruction, InitializeAccounts, MintAccounts, RouteAccounts, UpdateAccounts,
};
pub use registry::{CandyGuardProgram, GuardDescriptor, GuardRegistry};
pub use resolver::resolve_guards;
pub use state::CandyGuardAccount;
pub use types::{
    CandyGuardError, GuardContext, GuardInstructionArgs, ParsedGuardArgs, RemainingAccount,
};
