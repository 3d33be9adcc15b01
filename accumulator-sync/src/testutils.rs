//! Test fixtures and mock collaborators.
//!
//! Holds a deterministic stand-in for the external field hash primitive,
//! builders for event shapes and the canonical mock batch event used
//! across the test suite. Gated behind the `test-fixtures` feature so host
//! crates can reuse the fixtures in their own tests.

use primitive_types::U256;
use sha3::{Digest, Keccak256};

use crate::error::HashError;
use crate::event::{
    AccumulatorStateUpdate, CiphertextData, NotePreimage, PoolTransaction, Shield,
    ShieldCiphertext, StateUpdate, TokenDescriptor, TokenType, TreasuryFee,
};
use crate::hash::{FieldHasher, TokenHash};

/// 32-byte pattern shared by the mock event's nullifier, owner key and
/// bound params hash.
pub const TEST_BYTES_32: [u8; 32] = [
    0x11, 0x11, 0x22, 0x22, 0x33, 0x33, 0x44, 0x44, 0x55, 0x55, 0x66, 0x66, 0x77, 0x77, 0x88,
    0x88, 0x11, 0x11, 0x22, 0x22, 0x33, 0x33, 0x44, 0x44, 0x55, 0x55, 0x66, 0x66, 0x77, 0x77,
    0x88, 0x88,
];

/// Contract address of the mock event's ERC20 token.
pub const DEFAULT_TOKEN_ADDRESS: [u8; 20] = [
    0x11, 0x11, 0x11, 0x11, 0x22, 0x22, 0x22, 0x22, 0x33, 0x33, 0x33, 0x33, 0x44, 0x44, 0x44,
    0x44, 0x55, 0x55, 0x55, 0x55,
];

/// Token hash of the mock event's ERC20 token: its zero-padded contract
/// address.
pub const DEFAULT_TOKEN_ID: TokenHash = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x11, 0x11, 0x11,
    0x11, 0x22, 0x22, 0x22, 0x22, 0x33, 0x33, 0x33, 0x33, 0x44, 0x44, 0x44, 0x44, 0x55, 0x55,
    0x55, 0x55,
];

/// Decodes a hex string into a 32-byte array.
#[must_use]
pub fn bytes32(hex_str: &str) -> [u8; 32] {
    hex::decode(hex_str)
        .expect("valid hex fixture")
        .try_into()
        .expect("32 byte fixture")
}

/// Deterministic keccak-based stand-in for the external field hash
/// primitive.
///
/// Fungible tokens hash to their zero-padded contract address, mirroring
/// the upstream convention, so treasury fee fixtures keyed by padded
/// addresses resolve. Everything else is keccak-derived. Only identities
/// derived through the same mock are comparable; nothing here matches the
/// real field hash gadget.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockFieldHasher;

impl MockFieldHasher {
    /// Creates the mock hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FieldHasher for MockFieldHasher {
    fn hash3(&self, input1: U256, input2: U256, input3: U256) -> Result<U256, HashError> {
        let mut keccak = Keccak256::new();
        keccak.update(input1.to_big_endian());
        keccak.update(input2.to_big_endian());
        keccak.update(input3.to_big_endian());
        let digest: [u8; 32] = keccak.finalize().into();

        Ok(U256::from_big_endian(&digest))
    }

    fn token_hash(&self, token: &TokenDescriptor) -> Result<TokenHash, HashError> {
        match token.token_type {
            TokenType::Erc20 => {
                let mut token_hash = [0u8; 32];
                token_hash[12..].copy_from_slice(&token.token_address);
                Ok(token_hash)
            }
            TokenType::Erc721 | TokenType::Erc1155 => {
                let mut keccak = Keccak256::new();
                keccak.update([u8::from(token.token_type)]);
                keccak.update(token.token_address);
                keccak.update(token.token_sub_id.to_big_endian());
                Ok(keccak.finalize().into())
            }
        }
    }
}

macro_rules! build_method {
    ($name:ident, $localtype:ty) => {
        #[doc = "Set the $name field of the builder."]
        pub fn $name(&mut self, $name: $localtype) -> &mut Self {
            self.$name = Some($name);
            self
        }
    };
}

macro_rules! build_method_push {
    ($name:ident, $localtype:ty) => {
        #[doc = "Push a $ty to the builder."]
        pub fn $name(&mut self, $name: $localtype) -> &mut Self {
            self.$name.push($name);
            self
        }
    };
}

/// The mock event's ERC20 token descriptor.
#[must_use]
pub fn default_token() -> TokenDescriptor {
    TokenDescriptor {
        token_type: TokenType::Erc20,
        token_address: DEFAULT_TOKEN_ADDRESS,
        token_sub_id: U256::zero(),
    }
}

/// Builder for mock [`PoolTransaction`]s.
pub struct PoolTransactionBuilder {
    nullifiers: Vec<[u8; 32]>,
    commitments_count: Option<u32>,
    spend_accumulator_number: Option<u64>,
    unshield_preimage: Option<NotePreimage>,
    bound_params_hash: Option<[u8; 32]>,
}

impl PoolTransactionBuilder {
    /// Blank builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nullifiers: Vec::new(),
            commitments_count: None,
            spend_accumulator_number: None,
            unshield_preimage: None,
            bound_params_hash: None,
        }
    }

    build_method_push!(nullifiers, [u8; 32]);
    build_method!(commitments_count, u32);
    build_method!(spend_accumulator_number, u64);
    build_method!(unshield_preimage, NotePreimage);
    build_method!(bound_params_hash, [u8; 32]);

    /// Builds the mock transaction after all pieces are supplied.
    #[must_use]
    pub fn build(&self) -> PoolTransaction {
        PoolTransaction {
            nullifiers: self.nullifiers.clone(),
            commitments_count: self.commitments_count.unwrap(),
            spend_accumulator_number: self.spend_accumulator_number.unwrap(),
            unshield_preimage: self.unshield_preimage.clone().unwrap(),
            bound_params_hash: self.bound_params_hash.unwrap(),
        }
    }
}

impl Default for PoolTransactionBuilder {
    fn default() -> Self {
        let mut builder = Self::new();
        builder
            .nullifiers(TEST_BYTES_32)
            .commitments_count(3)
            .spend_accumulator_number(0)
            .unshield_preimage(NotePreimage {
                npk: TEST_BYTES_32,
                token: default_token(),
                value: U256::from(1_000_000_000u64),
            })
            .bound_params_hash(TEST_BYTES_32);
        builder
    }
}

/// Builder for mock [`Shield`]s.
pub struct ShieldBuilder {
    from: Option<[u8; 20]>,
    preimage: Option<NotePreimage>,
    encrypted_bundle: Vec<Vec<u8>>,
    shield_key: Option<[u8; 32]>,
}

impl ShieldBuilder {
    /// Blank builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            from: None,
            preimage: None,
            encrypted_bundle: Vec::new(),
            shield_key: None,
        }
    }

    build_method!(from, [u8; 20]);
    build_method!(preimage, NotePreimage);
    build_method_push!(encrypted_bundle, Vec<u8>);
    build_method!(shield_key, [u8; 32]);

    /// Builds the mock shield after all pieces are supplied.
    #[must_use]
    pub fn build(&self) -> Shield {
        Shield {
            from: self.from.unwrap(),
            preimage: self.preimage.clone().unwrap(),
            ciphertext: ShieldCiphertext {
                encrypted_bundle: self.encrypted_bundle.clone(),
                shield_key: self.shield_key.unwrap(),
            },
        }
    }
}

impl Default for ShieldBuilder {
    fn default() -> Self {
        let mut builder = Self::new();
        builder
            .from(DEFAULT_TOKEN_ADDRESS)
            .preimage(NotePreimage {
                npk: TEST_BYTES_32,
                token: default_token(),
                value: U256::from(2_000_000_000u64),
            })
            .encrypted_bundle(TEST_BYTES_32.to_vec())
            .encrypted_bundle(TEST_BYTES_32.to_vec())
            .shield_key(TEST_BYTES_32);
        builder
    }
}

/// The canonical mock batch event.
///
/// Three commitments produced by one transaction (with a 1_000_000_000
/// unshield of the default ERC20 token), one 2_000_000_000 shield of the
/// same token, three commitment ciphertexts and one 2_500_000 treasury fee
/// entry.
#[must_use]
pub fn accumulator_state_update_event() -> AccumulatorStateUpdate {
    let commitments = vec![
        TEST_BYTES_32,
        bytes32("1234567890123456789012345678901234567890123456789012345678901234"),
        bytes32("0000000099999999888888887777777766666666555555554444444433333333"),
    ];

    let commitment_ciphertext = vec![
        CiphertextData {
            ciphertext: hex::decode(
                "1010101010101010202020202020202030303030303030304040404040404040",
            )
            .expect("valid hex fixture"),
            blinded_sender_viewing_key: bytes32(
                "5050505050505050606060606060606070707070707070708080808080808080",
            ),
            blinded_receiver_viewing_key: bytes32(
                "9090909090909090a0a0a0a0a0a0a0a0b0b0b0b0b0b0b0b0c0c0c0c0c0c0c0c0",
            ),
        },
        CiphertextData {
            ciphertext: hex::decode(
                "1717171717171717272727272727272737373737373737374747474747474747",
            )
            .expect("valid hex fixture"),
            blinded_sender_viewing_key: bytes32(
                "5353535353535353636363636363636373737373737373738383838383838383",
            ),
            blinded_receiver_viewing_key: bytes32(
                "9292929292929292a2a2a2a2a2a2a2a2b2b2b2b2b2b2b2b2c2c2c2c2c2c2c2c2",
            ),
        },
        CiphertextData {
            ciphertext: hex::decode(
                "1919191919191919292929292929292939393939393939394949494949494949",
            )
            .expect("valid hex fixture"),
            blinded_sender_viewing_key: bytes32(
                "5151515151515151616161616161616171717171717171718181818181818181",
            ),
            blinded_receiver_viewing_key: bytes32(
                "9696969696969696a6a6a6a6a6a6a6a6b6b6b6b6b6b6b6b6c6c6c6c6c6c6c6c6",
            ),
        },
    ];

    AccumulatorStateUpdate {
        accumulator_number: 0,
        start_position: 0,
        update: StateUpdate {
            commitments,
            transactions: vec![PoolTransactionBuilder::default().build()],
            shields: vec![ShieldBuilder::default().build()],
            commitment_ciphertext,
            treasury_fees: vec![TreasuryFee {
                token_id: DEFAULT_TOKEN_ID,
                fee: U256::from(2_500_000u64),
            }],
            sender_ciphertext: hex::decode("12345678901234567890").expect("valid hex fixture"),
        },
        block_number: 1,
        block_timestamp: 1,
        transaction_hash: TEST_BYTES_32,
        log_index: 1,
    }
}
