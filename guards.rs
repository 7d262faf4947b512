//! Settings models for the guards compiled into the Candy Guard program.
//!
//! Every settings struct borsh-encodes to exactly [`BuiltinGuard::BYTE_WIDTH`]
//! bytes, which is what lets a guard set omit per-guard length prefixes.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use solana_sdk::pubkey::Pubkey;
use std::io::{Error, ErrorKind, Read, Write};

use crate::{constants::PROGRAM_GATE_MAX_PROGRAMS, types::RemainingAccount};

/// A guard whose settings layout is known to this crate
pub trait BuiltinGuard:
    BorshSerialize + BorshDeserialize + Serialize + DeserializeOwned + Sized
{
    const NAME: &'static str;
    const BYTE_WIDTH: usize;

    fn into_settings(self) -> GuardSettings;

    fn from_settings(settings: &GuardSettings) -> Option<&Self>;
}

macro_rules! builtin_guard {
    ($ty:ident, $name:literal, $width:expr) => {
        impl BuiltinGuard for $ty {
            const NAME: &'static str = $name;
            const BYTE_WIDTH: usize = $width;

            fn into_settings(self) -> GuardSettings {
                GuardSettings::$ty(self)
            }

            fn from_settings(settings: &GuardSettings) -> Option<&Self> {
                match settings {
                    GuardSettings::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for GuardSettings {
            fn from(settings: $ty) -> Self {
                GuardSettings::$ty(settings)
            }
        }
    };
}

/// Charge a penalty for invalid transactions instead of failing them
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BotTax {
    pub lamports: u64,
    /// Require the mint to be the last instruction of the transaction
    pub last_instruction: bool,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SolPayment {
    pub lamports: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub destination: Pubkey,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayment {
    pub amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub destination_ata: Pubkey,
}

/// Unix timestamp after which minting opens
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StartDate {
    pub date: i64,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThirdPartySigner {
    #[serde_as(as = "DisplayFromStr")]
    pub signer_key: Pubkey,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenGate {
    pub amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Gatekeeper {
    #[serde_as(as = "DisplayFromStr")]
    pub gatekeeper_network: Pubkey,
    pub expire_on_use: bool,
}

/// Unix timestamp after which minting closes
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EndDate {
    pub date: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AllowList {
    pub merkle_root: [u8; 32],
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MintLimit {
    /// Distinguishes several mint limits on one candy guard
    pub id: u8,
    pub limit: u16,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NftPayment {
    #[serde_as(as = "DisplayFromStr")]
    pub required_collection: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub destination: Pubkey,
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RedeemedAmount {
    pub maximum: u64,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AddressGate {
    #[serde_as(as = "DisplayFromStr")]
    pub address: Pubkey,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NftGate {
    #[serde_as(as = "DisplayFromStr")]
    pub required_collection: Pubkey,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NftBurn {
    #[serde_as(as = "DisplayFromStr")]
    pub required_collection: Pubkey,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenBurn {
    pub amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FreezeSolPayment {
    pub lamports: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub destination: Pubkey,
}

#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FreezeTokenPayment {
    pub amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub destination_ata: Pubkey,
}

/// Programs, besides the core ones, allowed to appear in a mint transaction.
///
/// Stored as a `u32` count followed by `PROGRAM_GATE_MAX_PROGRAMS` key slots;
/// unused slots are zeroed so the encoded size never changes.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProgramGate {
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub additional: Vec<Pubkey>,
}

impl BorshSerialize for ProgramGate {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if self.additional.len() > PROGRAM_GATE_MAX_PROGRAMS {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "at most {} additional programs are allowed, got {}",
                    PROGRAM_GATE_MAX_PROGRAMS,
                    self.additional.len()
                ),
            ));
        }
        BorshSerialize::serialize(&(self.additional.len() as u32), writer)?;
        for program in &self.additional {
            BorshSerialize::serialize(program, writer)?;
        }
        let padding = (PROGRAM_GATE_MAX_PROGRAMS - self.additional.len()) * 32;
        writer.write_all(&vec![0u8; padding])
    }
}

impl BorshDeserialize for ProgramGate {
    fn deserialize_reader<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let count = u32::deserialize_reader(reader)? as usize;
        if count > PROGRAM_GATE_MAX_PROGRAMS {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("program gate lists {} programs", count),
            ));
        }
        let mut additional = Vec::with_capacity(count);
        for _ in 0..count {
            additional.push(Pubkey::deserialize_reader(reader)?);
        }
        let mut padding = vec![0u8; (PROGRAM_GATE_MAX_PROGRAMS - count) * 32];
        reader.read_exact(&mut padding)?;
        Ok(Self { additional })
    }
}

builtin_guard!(BotTax, "botTax", 9);
builtin_guard!(SolPayment, "solPayment", 40);
builtin_guard!(TokenPayment, "tokenPayment", 72);
builtin_guard!(StartDate, "startDate", 8);
builtin_guard!(ThirdPartySigner, "thirdPartySigner", 32);
builtin_guard!(TokenGate, "tokenGate", 40);
builtin_guard!(Gatekeeper, "gatekeeper", 33);
builtin_guard!(EndDate, "endDate", 8);
builtin_guard!(AllowList, "allowList", 32);
builtin_guard!(MintLimit, "mintLimit", 3);
builtin_guard!(NftPayment, "nftPayment", 64);
builtin_guard!(RedeemedAmount, "redeemedAmount", 8);
builtin_guard!(AddressGate, "addressGate", 32);
builtin_guard!(NftGate, "nftGate", 32);
builtin_guard!(NftBurn, "nftBurn", 32);
builtin_guard!(TokenBurn, "tokenBurn", 40);
builtin_guard!(FreezeSolPayment, "freezeSolPayment", 40);
builtin_guard!(FreezeTokenPayment, "freezeTokenPayment", 72);
builtin_guard!(ProgramGate, "programGate", 4 + PROGRAM_GATE_MAX_PROGRAMS * 32);

/// Settings of one enabled guard
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum GuardSettings {
    BotTax(BotTax),
    SolPayment(SolPayment),
    TokenPayment(TokenPayment),
    StartDate(StartDate),
    ThirdPartySigner(ThirdPartySigner),
    TokenGate(TokenGate),
    Gatekeeper(Gatekeeper),
    EndDate(EndDate),
    AllowList(AllowList),
    MintLimit(MintLimit),
    NftPayment(NftPayment),
    RedeemedAmount(RedeemedAmount),
    AddressGate(AddressGate),
    NftGate(NftGate),
    NftBurn(NftBurn),
    TokenBurn(TokenBurn),
    FreezeSolPayment(FreezeSolPayment),
    FreezeTokenPayment(FreezeTokenPayment),
    ProgramGate(ProgramGate),
    /// Raw fixed-width settings of a guard registered at runtime
    Custom(Vec<u8>),
}

impl GuardSettings {
    /// Name of the guard these settings belong to, `custom` for raw settings
    pub fn kind(&self) -> &'static str {
        match self {
            GuardSettings::BotTax(_) => BotTax::NAME,
            GuardSettings::SolPayment(_) => SolPayment::NAME,
            GuardSettings::TokenPayment(_) => TokenPayment::NAME,
            GuardSettings::StartDate(_) => StartDate::NAME,
            GuardSettings::ThirdPartySigner(_) => ThirdPartySigner::NAME,
            GuardSettings::TokenGate(_) => TokenGate::NAME,
            GuardSettings::Gatekeeper(_) => Gatekeeper::NAME,
            GuardSettings::EndDate(_) => EndDate::NAME,
            GuardSettings::AllowList(_) => AllowList::NAME,
            GuardSettings::MintLimit(_) => MintLimit::NAME,
            GuardSettings::NftPayment(_) => NftPayment::NAME,
            GuardSettings::RedeemedAmount(_) => RedeemedAmount::NAME,
            GuardSettings::AddressGate(_) => AddressGate::NAME,
            GuardSettings::NftGate(_) => NftGate::NAME,
            GuardSettings::NftBurn(_) => NftBurn::NAME,
            GuardSettings::TokenBurn(_) => TokenBurn::NAME,
            GuardSettings::FreezeSolPayment(_) => FreezeSolPayment::NAME,
            GuardSettings::FreezeTokenPayment(_) => FreezeTokenPayment::NAME,
            GuardSettings::ProgramGate(_) => ProgramGate::NAME,
            GuardSettings::Custom(_) => "custom",
        }
    }
}

/// NFT a guard inspects, pays with or burns at mint time
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NftMintSettings {
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
    /// Defaults to the payer's associated token account of `mint`
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub token_account: Option<Pubkey>,
}

/// Caller-supplied input a guard needs at mint time
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GuardMintSettings {
    Gatekeeper {
        #[serde_as(as = "DisplayFromStr")]
        token_account: Pubkey,
    },
    NftPayment(NftMintSettings),
    NftGate(NftMintSettings),
    NftBurn(NftMintSettings),
    /// Pre-encoded arguments and accounts for a custom guard
    Custom {
        data: Vec<u8>,
        #[serde(skip)]
        remaining_accounts: Vec<RemainingAccount>,
    },
}

/// Freeze escrow operations exposed through the route instruction
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FreezeInstruction {
    Initialize {
        /// Seconds minted NFTs stay frozen
        period: i64,
        #[serde_as(as = "DisplayFromStr")]
        candy_guard_authority: Pubkey,
    },
    Thaw {
        #[serde_as(as = "DisplayFromStr")]
        nft_mint: Pubkey,
        #[serde_as(as = "DisplayFromStr")]
        nft_owner: Pubkey,
    },
    UnlockFunds {
        #[serde_as(as = "DisplayFromStr")]
        candy_guard_authority: Pubkey,
    },
}

impl FreezeInstruction {
    pub fn index(&self) -> u8 {
        match self {
            FreezeInstruction::Initialize { .. } => 0,
            FreezeInstruction::Thaw { .. } => 1,
            FreezeInstruction::UnlockFunds { .. } => 2,
        }
    }
}

/// Caller-supplied input for a guard route instruction
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GuardRouteSettings {
    /// Record that the payer is part of the allow list
    AllowList { merkle_proof: Vec<[u8; 32]> },
    Freeze(FreezeInstruction),
    /// Pre-encoded arguments and accounts for a custom guard
    Custom {
        data: Vec<u8>,
        #[serde(skip)]
        remaining_accounts: Vec<RemainingAccount>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_len<G: BuiltinGuard>(settings: &G) -> usize {
        borsh::to_vec(settings).unwrap().len()
    }

    #[test]
    fn test_encoded_sizes_match_declared_widths() {
        let key = Pubkey::new_unique();
        assert_eq!(encoded_len(&BotTax { lamports: 1, last_instruction: true }), BotTax::BYTE_WIDTH);
        assert_eq!(encoded_len(&SolPayment { lamports: 1, destination: key }), SolPayment::BYTE_WIDTH);
        assert_eq!(
            encoded_len(&TokenPayment { amount: 1, mint: key, destination_ata: key }),
            TokenPayment::BYTE_WIDTH
        );
        assert_eq!(encoded_len(&StartDate { date: 1 }), StartDate::BYTE_WIDTH);
        assert_eq!(encoded_len(&ThirdPartySigner { signer_key: key }), ThirdPartySigner::BYTE_WIDTH);
        assert_eq!(encoded_len(&TokenGate { amount: 1, mint: key }), TokenGate::BYTE_WIDTH);
        assert_eq!(
            encoded_len(&Gatekeeper { gatekeeper_network: key, expire_on_use: false }),
            Gatekeeper::BYTE_WIDTH
        );
        assert_eq!(encoded_len(&EndDate { date: 1 }), EndDate::BYTE_WIDTH);
        assert_eq!(encoded_len(&AllowList { merkle_root: [7; 32] }), AllowList::BYTE_WIDTH);
        assert_eq!(encoded_len(&MintLimit { id: 1, limit: 5 }), MintLimit::BYTE_WIDTH);
        assert_eq!(
            encoded_len(&NftPayment { required_collection: key, destination: key }),
            NftPayment::BYTE_WIDTH
        );
        assert_eq!(encoded_len(&RedeemedAmount { maximum: 10 }), RedeemedAmount::BYTE_WIDTH);
        assert_eq!(encoded_len(&AddressGate { address: key }), AddressGate::BYTE_WIDTH);
        assert_eq!(encoded_len(&NftGate { required_collection: key }), NftGate::BYTE_WIDTH);
        assert_eq!(encoded_len(&NftBurn { required_collection: key }), NftBurn::BYTE_WIDTH);
        assert_eq!(encoded_len(&TokenBurn { amount: 1, mint: key }), TokenBurn::BYTE_WIDTH);
        assert_eq!(
            encoded_len(&FreezeSolPayment { lamports: 1, destination: key }),
            FreezeSolPayment::BYTE_WIDTH
        );
        assert_eq!(
            encoded_len(&FreezeTokenPayment { amount: 1, mint: key, destination_ata: key }),
            FreezeTokenPayment::BYTE_WIDTH
        );
        assert_eq!(encoded_len(&ProgramGate { additional: vec![] }), ProgramGate::BYTE_WIDTH);
        assert_eq!(encoded_len(&ProgramGate { additional: vec![key; 5] }), ProgramGate::BYTE_WIDTH);
    }

    #[test]
    fn test_program_gate_padding_roundtrip() {
        let gate = ProgramGate {
            additional: vec![Pubkey::new_unique(), Pubkey::new_unique()],
        };
        let bytes = borsh::to_vec(&gate).unwrap();

        assert_eq!(&bytes[..4], &2u32.to_le_bytes());
        assert!(bytes[4 + 64..].iter().all(|byte| *byte == 0));
        assert_eq!(ProgramGate::try_from_slice(&bytes).unwrap(), gate);
    }

    #[test]
    fn test_program_gate_rejects_too_many_programs() {
        let gate = ProgramGate {
            additional: vec![Pubkey::new_unique(); PROGRAM_GATE_MAX_PROGRAMS + 1],
        };
        assert!(borsh::to_vec(&gate).is_err());
    }

    #[test]
    fn test_settings_kind() {
        let settings: GuardSettings = StartDate { date: 0 }.into();
        assert_eq!(settings.kind(), "startDate");
        assert_eq!(GuardSettings::Custom(vec![1]).kind(), "custom");
        assert!(StartDate::from_settings(&settings).is_some());
        assert!(EndDate::from_settings(&settings).is_none());
    }

    #[test]
    fn test_settings_json_uses_base58_keys() {
        let destination = Pubkey::new_unique();
        let json = serde_json::to_value(SolPayment {
            lamports: 5,
            destination,
        })
        .unwrap();

        assert_eq!(json["lamports"], 5);
        assert_eq!(json["destination"], destination.to_string());
    }
}
