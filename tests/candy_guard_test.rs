//! Integration tests for Candy Guard configuration encoding, group
//! resolution and instruction assembly.
//!
//! Everything runs offline: fixture addresses come from `Pubkey::new_unique`.

use candy_guard_codec::{
    assemble_mint, assemble_route, build_mint_instruction,
    guards::{AllowList, BotTax, EndDate, MintLimit, SolPayment, StartDate, ThirdPartySigner},
    instruction_discriminator, parser, serialize_guard_set, CandyGuardAccount,
    CandyGuardConfiguration, CandyGuardError, CandyGuardProgram, GuardContext, GuardDescriptor,
    GuardGroup, GuardMintSettings, GuardRegistry, GuardRouteSettings, GuardSet, GuardSettings,
    MintAccounts, RemainingAccount,
};
use solana_sdk::pubkey::Pubkey;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Registry `[botTax(9), solPayment(40), startDate(8)]`
fn small_program() -> (GuardRegistry, CandyGuardProgram) {
    (
        GuardRegistry::with_default_guards(),
        CandyGuardProgram::new(Pubkey::new_unique(), ["botTax", "solPayment", "startDate"]),
    )
}

fn context() -> GuardContext {
    GuardContext {
        program_id: Pubkey::new_unique(),
        candy_guard: Pubkey::new_unique(),
        candy_machine: Pubkey::new_unique(),
        payer: Pubkey::new_unique(),
        minter: Pubkey::new_unique(),
        nft_mint: Pubkey::new_unique(),
    }
}

fn sample_configuration() -> CandyGuardConfiguration {
    CandyGuardConfiguration::new(
        GuardSet::new()
            .with(
                "botTax",
                BotTax {
                    lamports: 10_000_000,
                    last_instruction: true,
                },
            )
            .with(
                "solPayment",
                SolPayment {
                    lamports: 1_500_000_000,
                    destination: Pubkey::new_unique(),
                },
            ),
        vec![
            GuardGroup::new(
                "early",
                GuardSet::new()
                    .with("startDate", StartDate { date: 1_700_000_000 })
                    .with("allowList", AllowList { merkle_root: [3; 32] }),
            ),
            GuardGroup::new(
                "public",
                GuardSet::new()
                    .with("startDate", StartDate { date: 1_700_086_400 })
                    .with("endDate", EndDate { date: 1_700_172_800 }),
            ),
        ],
    )
}

#[test]
fn test_full_program_roundtrip() {
    init_logger();
    let registry = GuardRegistry::with_default_guards();
    let program = CandyGuardProgram::default();
    let config = sample_configuration();

    let bytes = config.to_bytes(&registry, &program).unwrap();
    let decoded = CandyGuardConfiguration::from_bytes(&bytes, &registry, &program).unwrap();

    assert_eq!(decoded, config);
}

#[test]
fn test_feature_flags_mark_enabled_guards() {
    let registry = GuardRegistry::with_default_guards();
    let program = CandyGuardProgram::default();
    let config = sample_configuration();

    let bytes = config.to_bytes(&registry, &program).unwrap();

    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[..8]);
    word.reverse();
    let flags = u64::from_le_bytes(word);
    for (index, name) in program.guards.iter().enumerate() {
        assert_eq!(
            flags & (1 << index) != 0,
            config.guards.is_enabled(name),
            "flag for `{}`",
            name
        );
    }
}

#[test]
fn test_disabled_guards_take_no_space() {
    let registry = GuardRegistry::with_default_guards();
    let program = CandyGuardProgram::default();
    let available = registry.for_program(&program).unwrap();

    let empty = serialize_guard_set(&GuardSet::new(), &available).unwrap();
    assert_eq!(empty.len(), 8);

    let set: GuardSet<GuardSettings> = GuardSet::new()
        .with("startDate", StartDate { date: 1 })
        .with("mintLimit", MintLimit { id: 1, limit: 5 })
        .with("thirdPartySigner", ThirdPartySigner { signer_key: Pubkey::new_unique() });
    let bytes = serialize_guard_set(&set, &available).unwrap();
    assert_eq!(bytes.len(), 8 + 8 + 3 + 32);
}

#[test]
fn test_single_enabled_guard_scenario() {
    let (registry, program) = small_program();
    let available = registry.for_program(&program).unwrap();
    let set: GuardSet<GuardSettings> = GuardSet::new().with(
        "solPayment",
        SolPayment {
            lamports: 1,
            destination: Pubkey::new_unique(),
        },
    );

    let bytes = serialize_guard_set(&set, &available).unwrap();

    assert_eq!(bytes.len(), 48);
    let mut flags = [0u8; 8];
    flags.copy_from_slice(&bytes[..8]);
    flags.reverse();
    assert_eq!(flags[0] & 0b111, 0b010);
}

#[test]
fn test_label_boundary() {
    let (registry, program) = small_program();

    let six: CandyGuardConfiguration =
        CandyGuardConfiguration::new(GuardSet::new(), vec![GuardGroup::new("public", GuardSet::new())]);
    let bytes = six.to_bytes(&registry, &program).unwrap();
    assert_eq!(
        CandyGuardConfiguration::from_bytes(&bytes, &registry, &program).unwrap(),
        six
    );

    let seven: CandyGuardConfiguration =
        CandyGuardConfiguration::new(GuardSet::new(), vec![GuardGroup::new("publics", GuardSet::new())]);
    assert_eq!(
        seven.to_bytes(&registry, &program),
        Err(CandyGuardError::GroupLabelTooLong {
            label: "publics".to_string(),
            max: 6,
        })
    );
}

#[test]
fn test_group_precedence() {
    let defaults: GuardSet<&str> = GuardSet::new().with("A", "a");
    let group = GuardGroup::new("g", GuardSet::new().with("B", "b"));

    let resolved = candy_guard_codec::resolve_guards(&defaults, &[group], Some("g")).unwrap();

    assert_eq!(resolved.get("A"), Some(&"a"));
    assert_eq!(resolved.get("B"), Some(&"b"));
}

#[test]
fn test_unknown_group_lists_available() {
    let registry = GuardRegistry::with_default_guards();
    let program = CandyGuardProgram::default();

    let result = assemble_mint(
        &registry,
        &program,
        &sample_configuration(),
        Some("vip"),
        &GuardSet::new(),
        &context(),
    );

    assert_eq!(
        result,
        Err(CandyGuardError::UnknownGroup {
            label: "vip".to_string(),
            available: vec!["early".to_string(), "public".to_string()],
        })
    );
}

#[test]
fn test_unregistered_guard_is_rejected() {
    let (registry, program) = small_program();
    let config: CandyGuardConfiguration = CandyGuardConfiguration::new(
        GuardSet::new().with("mintLimit", MintLimit { id: 0, limit: 1 }),
        vec![],
    );

    assert_eq!(
        config.to_bytes(&registry, &program),
        Err(CandyGuardError::UnregisteredGuard("mintLimit".to_string()))
    );
}

#[test]
fn test_truncated_account_data() {
    let registry = GuardRegistry::with_default_guards();
    let program = CandyGuardProgram::default();
    let bytes = sample_configuration().to_bytes(&registry, &program).unwrap();

    for len in [0, 7, 8, 20, bytes.len() - 1] {
        assert!(
            matches!(
                CandyGuardConfiguration::from_bytes(&bytes[..len], &registry, &program),
                Err(CandyGuardError::MalformedBuffer { .. })
            ),
            "length {}",
            len
        );
    }
}

#[test]
fn test_assembly_is_deterministic() {
    init_logger();
    let registry = GuardRegistry::with_default_guards();
    let program = CandyGuardProgram::default();
    let config = sample_configuration();
    let ctx = context();

    let first = assemble_mint(&registry, &program, &config, Some("early"), &GuardSet::new(), &ctx)
        .unwrap();
    let second = assemble_mint(&registry, &program, &config, Some("early"), &GuardSet::new(), &ctx)
        .unwrap();
    assert_eq!(first, second);

    let route = GuardRouteSettings::AllowList {
        merkle_proof: vec![[1; 32], [2; 32]],
    };
    let first = assemble_route(&registry, &program, &config, Some("early"), "allowList", &route, &ctx)
        .unwrap();
    let second = assemble_route(&registry, &program, &config, Some("early"), "allowList", &route, &ctx)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_route_in_group_without_guard() {
    let registry = GuardRegistry::with_default_guards();
    let program = CandyGuardProgram::default();
    let route = GuardRouteSettings::AllowList {
        merkle_proof: vec![],
    };

    assert_eq!(
        assemble_route(
            &registry,
            &program,
            &sample_configuration(),
            Some("public"),
            "allowList",
            &route,
            &context(),
        ),
        Err(CandyGuardError::GuardNotEnabled {
            name: "allowList".to_string(),
            group: Some("public".to_string()),
        })
    );
}

#[test]
fn test_custom_guard() {
    init_logger();
    let mut registry = GuardRegistry::with_default_guards();
    registry
        .register(
            GuardDescriptor::custom("myGuard", 4)
                .with_mint_parser(parser::custom_mint)
                .with_route_parser(parser::custom_route),
        )
        .unwrap();
    assert_eq!(
        registry.register(GuardDescriptor::custom("myGuard", 4)),
        Err(CandyGuardError::DuplicateGuard("myGuard".to_string()))
    );

    let program = CandyGuardProgram::new(Pubkey::new_unique(), ["startDate", "myGuard"]);
    let config: CandyGuardConfiguration = CandyGuardConfiguration::new(
        GuardSet::new()
            .with("startDate", StartDate { date: 5 })
            .with("myGuard", GuardSettings::Custom(vec![1, 2, 3, 4])),
        vec![],
    );

    let bytes = config.to_bytes(&registry, &program).unwrap();
    assert_eq!(bytes.len(), 8 + 8 + 4 + 4);
    assert_eq!(&bytes[16..20], &[1u8, 2, 3, 4]);
    assert_eq!(
        CandyGuardConfiguration::from_bytes(&bytes, &registry, &program).unwrap(),
        config
    );

    let extra = Pubkey::new_unique();
    let mint_settings = GuardSet::new().with(
        "myGuard",
        GuardMintSettings::Custom {
            data: vec![9, 9],
            remaining_accounts: vec![RemainingAccount::signer(extra)],
        },
    );
    let args = assemble_mint(&registry, &program, &config, None, &mint_settings, &context()).unwrap();
    assert_eq!(args.arguments, vec![9, 9]);
    assert_eq!(args.signers, vec![extra]);

    let wrong_width: CandyGuardConfiguration = CandyGuardConfiguration::new(
        GuardSet::new().with("myGuard", GuardSettings::Custom(vec![1])),
        vec![],
    );
    assert_eq!(
        wrong_width.to_bytes(&registry, &program),
        Err(CandyGuardError::SettingsSizeMismatch {
            guard: "myGuard".to_string(),
            expected: 4,
            actual: 1,
        })
    );
}

#[test]
fn test_mint_instruction_from_account() {
    init_logger();
    let registry = GuardRegistry::with_default_guards();
    let program = CandyGuardProgram::default();
    let config = sample_configuration();
    let ctx = context();

    let account = CandyGuardAccount {
        base: Pubkey::new_unique(),
        bump: 255,
        authority: Pubkey::new_unique(),
        configuration: config.clone(),
    };
    let data = account.to_account_data(&registry, &program).unwrap();
    let fetched = CandyGuardAccount::from_account_data(&data, &registry, &program).unwrap();

    let args = assemble_mint(
        &registry,
        &program,
        &fetched.configuration,
        Some("early"),
        &GuardSet::new(),
        &ctx,
    )
    .unwrap();
    // solPayment destination, then the allowList proof PDA
    assert_eq!(args.accounts.len(), 2);
    let destination = match config.guards.get("solPayment") {
        Some(GuardSettings::SolPayment(settings)) => settings.destination,
        other => panic!("unexpected settings {:?}", other),
    };
    assert_eq!(args.accounts[0].pubkey, destination);

    let mint_accounts = MintAccounts::new(
        ctx.candy_guard,
        ctx.candy_machine,
        Pubkey::new_unique(),
        ctx.payer,
        ctx.nft_mint,
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
    );
    let ix = build_mint_instruction(&program, mint_accounts, args, Some("early")).unwrap();

    assert_eq!(ix.accounts.len(), 19 + 2);
    assert_eq!(&ix.data[..8], &instruction_discriminator("mint"));
    assert!(ix.data.ends_with(b"early"));
}

#[test]
fn test_json_configuration() {
    let registry = GuardRegistry::with_default_guards();
    let program = CandyGuardProgram::default();
    let destination = Pubkey::new_unique();
    let json = format!(
        r#"{{
            "guards": {{
                "solPayment": {{ "lamports": 100, "destination": "{}" }},
                "endDate": null
            }},
            "groups": [
                {{ "label": "early", "guards": {{ "startDate": {{ "date": 10 }} }} }}
            ]
        }}"#,
        destination
    );

    let config = CandyGuardConfiguration::from_json(&json, &registry).unwrap();
    assert_eq!(
        config.guards.get("solPayment"),
        Some(&GuardSettings::from(SolPayment {
            lamports: 100,
            destination,
        }))
    );
    assert!(!config.guards.is_enabled("endDate"));

    let bytes = config.to_bytes(&registry, &program).unwrap();
    assert_eq!(
        CandyGuardConfiguration::from_bytes(&bytes, &registry, &program).unwrap(),
        config
    );
}
