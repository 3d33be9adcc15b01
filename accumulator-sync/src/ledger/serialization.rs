//! Serialization and de-serialization of ledger records and the in-memory
//! ledger snapshot.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use primitive_types::U256;

use crate::event::TokenType;
use crate::ledger::memory::MemoryLedger;
use crate::ledger::{
    CommitmentCiphertext, CommitmentPreimage, Nullifier, RailgunTransaction, ShieldCommitment,
    Token, TransactCommitment, Unshield,
};

fn read_array<const N: usize, R: Read>(mut reader: R) -> io::Result<[u8; N]> {
    let mut array = [0u8; N];
    reader.read_exact(&mut array)?;

    Ok(array)
}

fn read_u256<R: Read>(reader: R) -> io::Result<U256> {
    Ok(U256::from_big_endian(&read_array::<32, R>(reader)?))
}

fn write_u256<W: Write>(mut writer: W, value: U256) -> io::Result<()> {
    writer.write_all(&value.to_big_endian())
}

fn read_byte_vec<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let len = reader.read_u64::<LittleEndian>()?;
    let mut bytes = vec![0; len as usize];
    reader.read_exact(&mut bytes)?;

    Ok(bytes)
}

fn write_byte_vec<W: Write>(mut writer: W, bytes: &[u8]) -> io::Result<()> {
    writer.write_u64::<LittleEndian>(bytes.len() as u64)?;
    writer.write_all(bytes)
}

fn read_vector<R: Read, T, F>(reader: &mut R, f: F) -> io::Result<Vec<T>>
where
    F: Fn(&mut R) -> io::Result<T>,
{
    let len = reader.read_u64::<LittleEndian>()?;
    let mut items = Vec::with_capacity(len as usize);
    for _ in 0..len {
        items.push(f(reader)?);
    }

    Ok(items)
}

fn write_vector<W: Write, T, F>(writer: &mut W, items: &[T], f: F) -> io::Result<()>
where
    F: Fn(&mut W, &T) -> io::Result<()>,
{
    writer.write_u64::<LittleEndian>(items.len() as u64)?;
    for item in items {
        f(writer, item)?;
    }

    Ok(())
}

fn read_token_type<R: Read>(mut reader: R) -> io::Result<TokenType> {
    TokenType::try_from(reader.read_u8()?)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

impl Token {
    fn serialized_version() -> u8 {
        0
    }

    /// Deserialize from `reader`
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let _version = reader.read_u8()?;
        let id = read_array::<32, _>(&mut reader)?;
        let token_type = read_token_type(&mut reader)?;
        let token_address = read_array::<20, _>(&mut reader)?;
        let token_sub_id = read_u256(&mut reader)?;

        Ok(Self {
            id,
            token_type,
            token_address,
            token_sub_id,
        })
    }

    /// Serialize into `writer`
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(Self::serialized_version())?;
        writer.write_all(&self.id)?;
        writer.write_u8(u8::from(self.token_type))?;
        writer.write_all(&self.token_address)?;
        write_u256(writer, self.token_sub_id)
    }
}

impl CommitmentPreimage {
    fn serialized_version() -> u8 {
        0
    }

    /// Deserialize from `reader`
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let _version = reader.read_u8()?;
        let id = read_array::<64, _>(&mut reader)?;
        let npk = read_array::<32, _>(&mut reader)?;
        let token = read_array::<32, _>(&mut reader)?;
        let value = read_u256(&mut reader)?;

        Ok(Self {
            id,
            npk,
            token,
            value,
        })
    }

    /// Serialize into `writer`
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(Self::serialized_version())?;
        writer.write_all(&self.id)?;
        writer.write_all(&self.npk)?;
        writer.write_all(&self.token)?;
        write_u256(writer, self.value)
    }
}

impl CommitmentCiphertext {
    fn serialized_version() -> u8 {
        0
    }

    /// Deserialize from `reader`
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let _version = reader.read_u8()?;
        let id = read_array::<64, _>(&mut reader)?;
        let ciphertext = read_byte_vec(&mut reader)?;
        let blinded_sender_viewing_key = read_array::<32, _>(&mut reader)?;
        let blinded_receiver_viewing_key = read_array::<32, _>(&mut reader)?;

        Ok(Self {
            id,
            ciphertext,
            blinded_sender_viewing_key,
            blinded_receiver_viewing_key,
        })
    }

    /// Serialize into `writer`
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(Self::serialized_version())?;
        writer.write_all(&self.id)?;
        write_byte_vec(&mut *writer, &self.ciphertext)?;
        writer.write_all(&self.blinded_sender_viewing_key)?;
        writer.write_all(&self.blinded_receiver_viewing_key)
    }
}

impl Nullifier {
    fn serialized_version() -> u8 {
        0
    }

    /// Deserialize from `reader`
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let _version = reader.read_u8()?;
        let id = read_array::<64, _>(&mut reader)?;
        let block_number = reader.read_u64::<LittleEndian>()?;
        let block_timestamp = reader.read_u64::<LittleEndian>()?;
        let transaction_hash = read_array::<32, _>(&mut reader)?;
        let tree_number = reader.read_u64::<LittleEndian>()?;
        let nullifier = read_array::<32, _>(&mut reader)?;

        Ok(Self {
            id,
            block_number,
            block_timestamp,
            transaction_hash,
            tree_number,
            nullifier,
        })
    }

    /// Serialize into `writer`
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(Self::serialized_version())?;
        writer.write_all(&self.id)?;
        writer.write_u64::<LittleEndian>(self.block_number)?;
        writer.write_u64::<LittleEndian>(self.block_timestamp)?;
        writer.write_all(&self.transaction_hash)?;
        writer.write_u64::<LittleEndian>(self.tree_number)?;
        writer.write_all(&self.nullifier)
    }
}

impl ShieldCommitment {
    fn serialized_version() -> u8 {
        0
    }

    /// Deserialize from `reader`
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let _version = reader.read_u8()?;
        let id = read_array::<64, _>(&mut reader)?;
        let block_number = reader.read_u64::<LittleEndian>()?;
        let block_timestamp = reader.read_u64::<LittleEndian>()?;
        let transaction_hash = read_array::<32, _>(&mut reader)?;
        let tree_number = reader.read_u64::<LittleEndian>()?;
        let tree_position = reader.read_u64::<LittleEndian>()?;
        let from = read_array::<20, _>(&mut reader)?;
        let commitment_hash = read_array::<32, _>(&mut reader)?;
        let preimage = read_array::<64, _>(&mut reader)?;
        let encrypted_bundle = read_vector(&mut reader, |r| read_byte_vec(&mut *r))?;
        let shield_key = read_array::<32, _>(&mut reader)?;
        let fee = read_u256(&mut reader)?;

        Ok(Self {
            id,
            block_number,
            block_timestamp,
            transaction_hash,
            tree_number,
            tree_position,
            from,
            commitment_hash,
            preimage,
            encrypted_bundle,
            shield_key,
            fee,
        })
    }

    /// Serialize into `writer`
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(Self::serialized_version())?;
        writer.write_all(&self.id)?;
        writer.write_u64::<LittleEndian>(self.block_number)?;
        writer.write_u64::<LittleEndian>(self.block_timestamp)?;
        writer.write_all(&self.transaction_hash)?;
        writer.write_u64::<LittleEndian>(self.tree_number)?;
        writer.write_u64::<LittleEndian>(self.tree_position)?;
        writer.write_all(&self.from)?;
        writer.write_all(&self.commitment_hash)?;
        writer.write_all(&self.preimage)?;
        write_vector(writer, &self.encrypted_bundle, |w, blob| {
            write_byte_vec(&mut *w, blob)
        })?;
        writer.write_all(&self.shield_key)?;
        write_u256(writer, self.fee)
    }
}

impl TransactCommitment {
    fn serialized_version() -> u8 {
        0
    }

    /// Deserialize from `reader`
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let _version = reader.read_u8()?;
        let id = read_array::<64, _>(&mut reader)?;
        let block_number = reader.read_u64::<LittleEndian>()?;
        let block_timestamp = reader.read_u64::<LittleEndian>()?;
        let transaction_hash = read_array::<32, _>(&mut reader)?;
        let tree_number = reader.read_u64::<LittleEndian>()?;
        let batch_start_tree_position = reader.read_u64::<LittleEndian>()?;
        let transact_index = reader.read_u64::<LittleEndian>()?;
        let hashes = read_vector(&mut reader, |r| read_array::<32, _>(&mut *r))?;
        let commitment_ciphertexts = read_vector(&mut reader, |r| read_array::<64, _>(&mut *r))?;
        let sender_ciphertext = read_byte_vec(&mut reader)?;

        Ok(Self {
            id,
            block_number,
            block_timestamp,
            transaction_hash,
            tree_number,
            batch_start_tree_position,
            transact_index,
            hashes,
            commitment_ciphertexts,
            sender_ciphertext,
        })
    }

    /// Serialize into `writer`
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(Self::serialized_version())?;
        writer.write_all(&self.id)?;
        writer.write_u64::<LittleEndian>(self.block_number)?;
        writer.write_u64::<LittleEndian>(self.block_timestamp)?;
        writer.write_all(&self.transaction_hash)?;
        writer.write_u64::<LittleEndian>(self.tree_number)?;
        writer.write_u64::<LittleEndian>(self.batch_start_tree_position)?;
        writer.write_u64::<LittleEndian>(self.transact_index)?;
        write_vector(writer, &self.hashes, |w, hash| w.write_all(hash))?;
        write_vector(writer, &self.commitment_ciphertexts, |w, id| {
            w.write_all(id)
        })?;
        write_byte_vec(writer, &self.sender_ciphertext)
    }
}

impl Unshield {
    fn serialized_version() -> u8 {
        0
    }

    /// Deserialize from `reader`
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let _version = reader.read_u8()?;
        let id = read_array::<96, _>(&mut reader)?;
        let block_number = reader.read_u64::<LittleEndian>()?;
        let block_timestamp = reader.read_u64::<LittleEndian>()?;
        let transaction_hash = read_array::<32, _>(&mut reader)?;
        let to = read_array::<20, _>(&mut reader)?;
        let token = read_array::<32, _>(&mut reader)?;
        let amount = read_u256(&mut reader)?;
        let fee = read_u256(&mut reader)?;
        let transact_commitment_batch_index = reader.read_u64::<LittleEndian>()?;

        Ok(Self {
            id,
            block_number,
            block_timestamp,
            transaction_hash,
            to,
            token,
            amount,
            fee,
            transact_commitment_batch_index,
        })
    }

    /// Serialize into `writer`
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(Self::serialized_version())?;
        writer.write_all(&self.id)?;
        writer.write_u64::<LittleEndian>(self.block_number)?;
        writer.write_u64::<LittleEndian>(self.block_timestamp)?;
        writer.write_all(&self.transaction_hash)?;
        writer.write_all(&self.to)?;
        writer.write_all(&self.token)?;
        write_u256(&mut *writer, self.amount)?;
        write_u256(&mut *writer, self.fee)?;
        writer.write_u64::<LittleEndian>(self.transact_commitment_batch_index)
    }
}

impl RailgunTransaction {
    fn serialized_version() -> u8 {
        0
    }

    /// Deserialize from `reader`
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let _version = reader.read_u8()?;
        let id = read_array::<96, _>(&mut reader)?;
        let transaction_hash = read_array::<32, _>(&mut reader)?;
        let block_number = reader.read_u64::<LittleEndian>()?;
        let block_timestamp = reader.read_u64::<LittleEndian>()?;
        let nullifiers = read_vector(&mut reader, |r| read_array::<32, _>(&mut *r))?;
        let commitments = read_vector(&mut reader, |r| read_array::<32, _>(&mut *r))?;
        let bound_params_hash = read_array::<32, _>(&mut reader)?;
        let has_unshield = reader.read_u8()? != 0;
        let utxo_tree_in = reader.read_u64::<LittleEndian>()?;
        let utxo_tree_out = reader.read_u64::<LittleEndian>()?;
        let utxo_batch_start_position_out = reader.read_u64::<LittleEndian>()?;
        let unshield_token = read_array::<32, _>(&mut reader)?;
        let unshield_to_address = read_array::<20, _>(&mut reader)?;
        let unshield_value = read_u256(&mut reader)?;
        let verification_hash = read_array::<32, _>(&mut reader)?;

        Ok(Self {
            id,
            transaction_hash,
            block_number,
            block_timestamp,
            nullifiers,
            commitments,
            bound_params_hash,
            has_unshield,
            utxo_tree_in,
            utxo_tree_out,
            utxo_batch_start_position_out,
            unshield_token,
            unshield_to_address,
            unshield_value,
            verification_hash,
        })
    }

    /// Serialize into `writer`
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(Self::serialized_version())?;
        writer.write_all(&self.id)?;
        writer.write_all(&self.transaction_hash)?;
        writer.write_u64::<LittleEndian>(self.block_number)?;
        writer.write_u64::<LittleEndian>(self.block_timestamp)?;
        write_vector(writer, &self.nullifiers, |w, nullifier| {
            w.write_all(nullifier)
        })?;
        write_vector(writer, &self.commitments, |w, commitment| {
            w.write_all(commitment)
        })?;
        writer.write_all(&self.bound_params_hash)?;
        writer.write_u8(u8::from(self.has_unshield))?;
        writer.write_u64::<LittleEndian>(self.utxo_tree_in)?;
        writer.write_u64::<LittleEndian>(self.utxo_tree_out)?;
        writer.write_u64::<LittleEndian>(self.utxo_batch_start_position_out)?;
        writer.write_all(&self.unshield_token)?;
        writer.write_all(&self.unshield_to_address)?;
        write_u256(&mut *writer, self.unshield_value)?;
        writer.write_all(&self.verification_hash)
    }
}

impl MemoryLedger {
    fn serialized_version() -> u8 {
        0
    }

    /// Deserialize a ledger snapshot from `reader`
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let _version = reader.read_u8()?;

        let tokens = read_vector(&mut reader, |r| Token::read(&mut *r))?
            .into_iter()
            .map(|token| (token.id, token))
            .collect();
        let commitment_preimages = read_vector(&mut reader, |r| CommitmentPreimage::read(&mut *r))?
            .into_iter()
            .map(|preimage| (preimage.id, preimage))
            .collect();
        let commitment_ciphertexts =
            read_vector(&mut reader, |r| CommitmentCiphertext::read(&mut *r))?
                .into_iter()
                .map(|ciphertext| (ciphertext.id, ciphertext))
                .collect();
        let shield_commitments = read_vector(&mut reader, |r| ShieldCommitment::read(&mut *r))?
            .into_iter()
            .map(|shield| (shield.id, shield))
            .collect();
        let transact_commitments = read_vector(&mut reader, |r| TransactCommitment::read(&mut *r))?
            .into_iter()
            .map(|transact| (transact.id, transact))
            .collect();
        let nullifiers = read_vector(&mut reader, |r| Nullifier::read(&mut *r))?
            .into_iter()
            .map(|nullifier| (nullifier.id, nullifier))
            .collect();
        let unshields = read_vector(&mut reader, |r| Unshield::read(&mut *r))?
            .into_iter()
            .map(|unshield| (unshield.id, unshield))
            .collect();
        let railgun_transactions =
            read_vector(&mut reader, |r| RailgunTransaction::read(&mut *r))?
                .into_iter()
                .map(|transaction| (transaction.id, transaction))
                .collect();
        let verification_hash = if reader.read_u8()? != 0 {
            Some(read_array::<32, _>(&mut reader)?)
        } else {
            None
        };

        Ok(Self {
            tokens,
            commitment_preimages,
            commitment_ciphertexts,
            shield_commitments,
            transact_commitments,
            nullifiers,
            unshields,
            railgun_transactions,
            verification_hash,
        })
    }

    /// Serialize the ledger snapshot into `writer`
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(Self::serialized_version())?;

        let tokens: Vec<_> = self.tokens.values().cloned().collect();
        write_vector(writer, &tokens, |w, token| token.write(w))?;
        let preimages: Vec<_> = self.commitment_preimages.values().cloned().collect();
        write_vector(writer, &preimages, |w, preimage| preimage.write(w))?;
        let ciphertexts: Vec<_> = self.commitment_ciphertexts.values().cloned().collect();
        write_vector(writer, &ciphertexts, |w, ciphertext| ciphertext.write(w))?;
        let shields: Vec<_> = self.shield_commitments.values().cloned().collect();
        write_vector(writer, &shields, |w, shield| shield.write(w))?;
        let transacts: Vec<_> = self.transact_commitments.values().cloned().collect();
        write_vector(writer, &transacts, |w, transact| transact.write(w))?;
        let nullifiers: Vec<_> = self.nullifiers.values().cloned().collect();
        write_vector(writer, &nullifiers, |w, nullifier| nullifier.write(w))?;
        let unshields: Vec<_> = self.unshields.values().cloned().collect();
        write_vector(writer, &unshields, |w, unshield| unshield.write(w))?;
        let transactions: Vec<_> = self.railgun_transactions.values().cloned().collect();
        write_vector(writer, &transactions, |w, transaction| transaction.write(w))?;

        match self.verification_hash {
            Some(verification_hash) => {
                writer.write_u8(1)?;
                writer.write_all(&verification_hash)
            }
            None => writer.write_u8(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ledger::memory::MemoryLedger;
    use crate::reduce::apply_state_update;
    use crate::testutils::{accumulator_state_update_event, MockFieldHasher};

    #[test]
    fn ledger_snapshot_round_trips() {
        let hasher = MockFieldHasher::new();
        let mut ledger = MemoryLedger::new();
        apply_state_update(&mut ledger, &hasher, &accumulator_state_update_event()).unwrap();

        let mut snapshot = Vec::new();
        ledger.write(&mut snapshot).unwrap();
        let restored = MemoryLedger::read(snapshot.as_slice()).unwrap();

        assert_eq!(restored, ledger);
    }
}
