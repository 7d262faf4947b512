//! Byte layout of a Candy Guard configuration.
//!
//! ```text
//! guard set  := flags[8] settings(enabled guards, program order)
//! config     := guard set (defaults) ++ u32 LE group count ++ group*
//! group      := label[6, space padded] ++ guard set
//! ```
//!
//! Guard settings carry no length prefix; a guard set is self-describing only
//! through its feature flags and the fixed width of every enabled guard.

use log::{debug, trace};
use std::collections::HashSet;

use crate::{
    config::{referenced_guards, CandyGuardConfiguration, GuardGroup, GuardSet},
    constants::{FEATURE_FLAGS_SIZE, GROUP_LABEL_SIZE},
    feature_flags::FeatureFlags,
    guards::GuardSettings,
    registry::{CandyGuardProgram, GuardDescriptor, GuardRegistry},
    types::CandyGuardError,
};

/// Fills the unused tail of a group label on the wire
const LABEL_PADDING: char = ' ';

/// Bounds-checked cursor over a settings buffer
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CandyGuardError> {
        let remaining = self.bytes.len() - self.offset;
        if len > remaining {
            return Err(CandyGuardError::MalformedBuffer {
                offset: self.offset,
                needed: len,
                remaining,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CandyGuardError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }
}

fn check_referenced_guards(
    guards: &GuardSet<GuardSettings>,
    groups: &[GuardGroup<GuardSettings>],
    available: &[&GuardDescriptor],
) -> Result<(), CandyGuardError> {
    for name in referenced_guards(guards, groups) {
        if !available.iter().any(|guard| guard.name == name) {
            return Err(CandyGuardError::UnregisteredGuard(name.to_string()));
        }
    }
    Ok(())
}

fn check_group_labels(groups: &[GuardGroup<GuardSettings>]) -> Result<(), CandyGuardError> {
    let mut seen = HashSet::new();
    for group in groups {
        if group.label.len() > GROUP_LABEL_SIZE {
            return Err(CandyGuardError::GroupLabelTooLong {
                label: group.label.clone(),
                max: GROUP_LABEL_SIZE,
            });
        }
        if group.label.ends_with([LABEL_PADDING, '\0']) {
            return Err(CandyGuardError::GroupLabelPadding(group.label.clone()));
        }
        if !seen.insert(group.label.as_str()) {
            return Err(CandyGuardError::DuplicateGroupLabel(group.label.clone()));
        }
    }
    Ok(())
}

fn serialize_set(
    set: &GuardSet<GuardSettings>,
    available: &[&GuardDescriptor],
    out: &mut Vec<u8>,
) -> Result<(), CandyGuardError> {
    let flags = FeatureFlags::from_enabled(available.iter().map(|guard| set.is_enabled(&guard.name)))?;
    out.extend_from_slice(&flags.to_bytes());

    let start = out.len();
    for guard in available {
        if let Some(settings) = set.get(&guard.name) {
            out.extend_from_slice(&guard.serialize_settings(settings)?);
        }
    }
    trace!(
        "Serialized guard set: flags {:02x?}, {} enabled guards, {} settings bytes",
        flags.to_bytes(),
        flags.count(),
        out.len() - start
    );
    Ok(())
}

fn deserialize_set(
    reader: &mut Reader<'_>,
    available: &[&GuardDescriptor],
) -> Result<GuardSet<GuardSettings>, CandyGuardError> {
    let flags = FeatureFlags::from_bytes(reader.take_array::<FEATURE_FLAGS_SIZE>()?, available.len())?;
    trace!("Decoding guard set with flags {:02x?}", flags.to_bytes());

    let mut set = GuardSet::new();
    for (index, guard) in available.iter().enumerate() {
        if flags.is_set(index) {
            let settings = guard.deserialize_settings(reader.take(guard.byte_width)?)?;
            set.set(guard.name.clone(), Some(settings));
        }
    }
    Ok(set)
}

/// Serialize a single guard set: feature flags followed by enabled settings
pub fn serialize_guard_set(
    set: &GuardSet<GuardSettings>,
    available: &[&GuardDescriptor],
) -> Result<Vec<u8>, CandyGuardError> {
    check_referenced_guards(set, &[], available)?;
    let mut out = Vec::new();
    serialize_set(set, available, &mut out)?;
    Ok(out)
}

fn encode_label(label: &str) -> [u8; GROUP_LABEL_SIZE] {
    let mut encoded = [LABEL_PADDING as u8; GROUP_LABEL_SIZE];
    encoded[..label.len()].copy_from_slice(label.as_bytes());
    encoded
}

fn decode_label(bytes: &[u8]) -> Result<String, CandyGuardError> {
    let label = std::str::from_utf8(bytes).map_err(|e| CandyGuardError::InvalidAccountData(
        format!("group label is not valid UTF-8: {}", e),
    ))?;
    Ok(label.trim_end_matches([LABEL_PADDING, '\0']).to_string())
}

/// Serialize default guards and groups for the given available guards.
///
/// Every enabled guard must be among `available`, every label must fit in
/// [`GROUP_LABEL_SIZE`] bytes and labels must be unique.
pub fn serialize_guard_settings(
    guards: &GuardSet<GuardSettings>,
    groups: &[GuardGroup<GuardSettings>],
    available: &[&GuardDescriptor],
) -> Result<Vec<u8>, CandyGuardError> {
    check_referenced_guards(guards, groups, available)?;
    check_group_labels(groups)?;

    let mut out = Vec::new();
    serialize_set(guards, available, &mut out)?;

    out.extend_from_slice(&(groups.len() as u32).to_le_bytes());
    for group in groups {
        out.extend_from_slice(&encode_label(&group.label));
        serialize_set(&group.guards, available, &mut out)?;
    }

    debug!(
        "Serialized candy guard settings: {} groups, {} bytes",
        groups.len(),
        out.len()
    );
    Ok(out)
}

/// Deserialize default guards and groups for the given available guards.
///
/// Bytes after the last group are ignored: accounts are often allocated
/// larger than the settings they hold.
pub fn deserialize_guard_settings(
    bytes: &[u8],
    available: &[&GuardDescriptor],
) -> Result<CandyGuardConfiguration<GuardSettings>, CandyGuardError> {
    let mut reader = Reader::new(bytes);
    let guards = deserialize_set(&mut reader, available)?;

    let group_count = u32::from_le_bytes(reader.take_array::<4>()?);
    let mut groups = Vec::new();
    for _ in 0..group_count {
        let label = decode_label(reader.take(GROUP_LABEL_SIZE)?)?;
        let guards = deserialize_set(&mut reader, available)?;
        groups.push(GuardGroup::new(label, guards));
    }

    if reader.remaining() > 0 {
        trace!("Ignoring {} trailing bytes after guard settings", reader.remaining());
    }
    debug!(
        "Deserialized candy guard settings: {} default guards, {} groups",
        guards.len(),
        groups.len()
    );
    Ok(CandyGuardConfiguration::new(guards, groups))
}

impl CandyGuardConfiguration<GuardSettings> {
    /// Encode this configuration for `program`
    pub fn to_bytes(
        &self,
        registry: &GuardRegistry,
        program: &CandyGuardProgram,
    ) -> Result<Vec<u8>, CandyGuardError> {
        let available = registry.for_program(program)?;
        serialize_guard_settings(&self.guards, &self.groups, &available)
    }

    /// Decode a configuration stored for `program`
    pub fn from_bytes(
        bytes: &[u8],
        registry: &GuardRegistry,
        program: &CandyGuardProgram,
    ) -> Result<Self, CandyGuardError> {
        let available = registry.for_program(program)?;
        deserialize_guard_settings(bytes, &available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::{BotTax, MintLimit, SolPayment, StartDate};
    use solana_sdk::pubkey::Pubkey;

    fn three_guard_registry() -> (GuardRegistry, CandyGuardProgram) {
        let registry = GuardRegistry::with_default_guards();
        let program = CandyGuardProgram::new(
            Pubkey::new_unique(),
            ["botTax", "solPayment", "startDate"],
        );
        (registry, program)
    }

    #[test]
    fn test_single_guard_layout() {
        let (registry, program) = three_guard_registry();
        let destination = Pubkey::new_unique();
        let config: CandyGuardConfiguration = CandyGuardConfiguration::new(
            GuardSet::new().with(
                "solPayment",
                SolPayment {
                    lamports: 1_000,
                    destination,
                },
            ),
            vec![],
        );

        let bytes = config.to_bytes(&registry, &program).unwrap();

        // flags + solPayment + group count
        assert_eq!(bytes.len(), 8 + 40 + 4);
        assert_eq!(&bytes[..8], &[0u8, 0, 0, 0, 0, 0, 0, 0b010]);
        assert_eq!(&bytes[8..16], &1_000u64.to_le_bytes());
        assert_eq!(&bytes[16..48], destination.as_ref());
        assert_eq!(&bytes[48..], &[0u8; 4]);
    }

    #[test]
    fn test_groups_are_padded_and_flagged_independently() {
        let (registry, program) = three_guard_registry();
        let config: CandyGuardConfiguration = CandyGuardConfiguration::new(
            GuardSet::new().with(
                "botTax",
                BotTax {
                    lamports: 10,
                    last_instruction: true,
                },
            ),
            vec![
                GuardGroup::new("early", GuardSet::new().with("startDate", StartDate { date: 1 })),
                GuardGroup::new("public", GuardSet::new()),
            ],
        );

        let bytes = config.to_bytes(&registry, &program).unwrap();

        let groups_start = 8 + 9;
        assert_eq!(&bytes[groups_start..groups_start + 4], &2u32.to_le_bytes());
        let early = groups_start + 4;
        assert_eq!(&bytes[early..early + 6], b"early ");
        assert_eq!(&bytes[early + 6..early + 14], &[0u8, 0, 0, 0, 0, 0, 0, 0b100]);
        let public = early + 6 + 8 + 8;
        assert_eq!(&bytes[public..public + 6], b"public");
        assert_eq!(&bytes[public + 6..public + 14], &[0u8; 8]);
        assert_eq!(bytes.len(), public + 14);

        assert_eq!(
            CandyGuardConfiguration::from_bytes(&bytes, &registry, &program).unwrap(),
            config
        );
    }

    #[test]
    fn test_label_too_long() {
        let (registry, program) = three_guard_registry();
        let config: CandyGuardConfiguration =
            CandyGuardConfiguration::new(GuardSet::new(), vec![GuardGroup::new("seventh", GuardSet::new())]);

        assert_eq!(
            config.to_bytes(&registry, &program),
            Err(CandyGuardError::GroupLabelTooLong {
                label: "seventh".to_string(),
                max: 6,
            })
        );
    }

    #[test]
    fn test_duplicate_label() {
        let (registry, program) = three_guard_registry();
        let config: CandyGuardConfiguration = CandyGuardConfiguration::new(
            GuardSet::new(),
            vec![
                GuardGroup::new("vip", GuardSet::new()),
                GuardGroup::new("vip", GuardSet::new()),
            ],
        );

        assert_eq!(
            config.to_bytes(&registry, &program),
            Err(CandyGuardError::DuplicateGroupLabel("vip".to_string()))
        );
    }

    #[test]
    fn test_label_ending_in_padding_is_rejected() {
        let (registry, program) = three_guard_registry();
        // "ab " would decode as "ab" and collide with the first group
        let config: CandyGuardConfiguration = CandyGuardConfiguration::new(
            GuardSet::new(),
            vec![
                GuardGroup::new("ab", GuardSet::new()),
                GuardGroup::new("ab ", GuardSet::new()),
            ],
        );
        assert_eq!(
            config.to_bytes(&registry, &program),
            Err(CandyGuardError::GroupLabelPadding("ab ".to_string()))
        );

        let config: CandyGuardConfiguration =
            CandyGuardConfiguration::new(GuardSet::new(), vec![GuardGroup::new("vip\0", GuardSet::new())]);
        assert_eq!(
            config.to_bytes(&registry, &program),
            Err(CandyGuardError::GroupLabelPadding("vip\0".to_string()))
        );

        // inner spaces survive the round trip
        let config: CandyGuardConfiguration =
            CandyGuardConfiguration::new(GuardSet::new(), vec![GuardGroup::new("a b", GuardSet::new())]);
        let bytes = config.to_bytes(&registry, &program).unwrap();
        assert_eq!(
            CandyGuardConfiguration::from_bytes(&bytes, &registry, &program).unwrap(),
            config
        );
    }

    #[test]
    fn test_guard_not_available_for_program() {
        let (registry, program) = three_guard_registry();
        let config: CandyGuardConfiguration = CandyGuardConfiguration::new(
            GuardSet::new(),
            vec![GuardGroup::new(
                "vip",
                GuardSet::new().with("mintLimit", MintLimit { id: 0, limit: 1 }),
            )],
        );

        assert_eq!(
            config.to_bytes(&registry, &program),
            Err(CandyGuardError::UnregisteredGuard("mintLimit".to_string()))
        );
    }

    #[test]
    fn test_truncated_buffer() {
        let (registry, program) = three_guard_registry();
        let mut bytes = vec![0, 0, 0, 0, 0, 0, 0, 0b010];
        bytes.extend_from_slice(&[1; 20]);

        assert_eq!(
            CandyGuardConfiguration::from_bytes(&bytes, &registry, &program),
            Err(CandyGuardError::MalformedBuffer {
                offset: 8,
                needed: 40,
                remaining: 20,
            })
        );
        assert!(matches!(
            CandyGuardConfiguration::from_bytes(&[0; 4], &registry, &program),
            Err(CandyGuardError::MalformedBuffer { .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let (registry, program) = three_guard_registry();
        let config: CandyGuardConfiguration =
            CandyGuardConfiguration::new(GuardSet::new().with("startDate", StartDate { date: 7 }), vec![]);
        let mut bytes = config.to_bytes(&registry, &program).unwrap();
        bytes.extend_from_slice(&[0; 64]);

        assert_eq!(
            CandyGuardConfiguration::from_bytes(&bytes, &registry, &program).unwrap(),
            config
        );
    }

    #[test]
    fn test_decode_label_trims_padding() {
        assert_eq!(decode_label(b"vip   ").unwrap(), "vip");
        assert_eq!(decode_label(b"vip\0\0\0").unwrap(), "vip");
        assert_eq!(decode_label(b"public").unwrap(), "public");
    }
}
