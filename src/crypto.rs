//! The format's stream cipher and string hash.
//!
//! Both consume a shared 1280-entry lookup table derived from a fixed PRNG
//! seed. The table is computed once per process and is read-only afterwards.

use byteorder::{ByteOrder, BE, LE};
use lazy_static::lazy_static;

use super::consts::*;

lazy_static! {
    static ref CRYPTO_TABLE: [u32; 0x500] = generate_crypto_table();
}

fn generate_crypto_table() -> [u32; 0x500] {
    let mut crypto_table = [0u32; 0x500];
    let mut seed: u32 = 0x0010_0001;

    for i in 0..0x100 {
        for j in 0..5 {
            let index = i + j * 0x100;
            seed = (seed * 125 + 3) % 0x002A_AAAB;
            let t1 = (seed & 0xFFFF) << 0x10;
            seed = (seed * 125 + 3) % 0x002A_AAAB;
            let t2 = seed & 0xFFFF;

            crypto_table[index] = t1 | t2;
        }
    }

    crypto_table
}

/// Hashes an uppercased filename under one of the four hash roles
/// (`MPQ_HASH_TABLE_INDEX`, `MPQ_HASH_NAME_A`, `MPQ_HASH_NAME_B`,
/// `MPQ_HASH_TABLE_KEY`).
pub fn hash_string(source: &[u8], hash_type: u32) -> u32 {
    let mut seed1: u32 = 0x7FED_7FED;
    let mut seed2: u32 = 0xEEEE_EEEE;

    for byte in source {
        let upper = u32::from(byte.to_ascii_uppercase());

        seed1 = CRYPTO_TABLE[(hash_type + upper) as usize] ^ (seed1.overflowing_add(seed2)).0;
        seed2 = upper
            .overflowing_add(seed1)
            .0
            .overflowing_add(seed2)
            .0
            .overflowing_add(seed2 << 5)
            .0
            .overflowing_add(3)
            .0;
    }

    seed1
}

/// Decrypts a block of 32-bit words in place under `key`.
///
/// Words are consumed little-endian and written back big-endian. The swap is
/// contractual: the table parsers read the decrypted records back as
/// big-endian, and existing consumers of the format depend on both halves.
///
/// Bytes past the last aligned word are not encrypted and are left untouched.
pub fn decrypt_block(data: &mut [u8], mut key: u32) {
    let iterations = data.len() / 4;

    let mut key_secondary: u32 = 0xEEEE_EEEE;

    for i in 0..iterations {
        let pos = i * 4;

        key_secondary = key_secondary
            .overflowing_add(CRYPTO_TABLE[(MPQ_HASH_KEY2_MIX + (key & 0xFF)) as usize])
            .0;

        let word = LE::read_u32(&data[pos..pos + 4]);
        let clear = word ^ key.overflowing_add(key_secondary).0;
        BE::write_u32(&mut data[pos..pos + 4], clear);

        key = ((!key << 0x15).overflowing_add(0x1111_1111).0) | (key >> 0x0B);
        key_secondary = clear
            .overflowing_add(key_secondary)
            .0
            .overflowing_add(key_secondary << 5)
            .0
            .overflowing_add(3)
            .0;
    }
}

/// Encrypts a block of 32-bit words in place under `key`.
///
/// Exact inverse of [`decrypt_block`]: plaintext words are consumed
/// big-endian and the ciphertext is written back little-endian. The reader
/// itself never encrypts; this exists so tests and tooling can build
/// archives whose tables decrypt correctly.
pub fn encrypt_block(data: &mut [u8], mut key: u32) {
    let iterations = data.len() / 4;

    let mut key_secondary: u32 = 0xEEEE_EEEE;

    for i in 0..iterations {
        let pos = i * 4;

        key_secondary = key_secondary
            .overflowing_add(CRYPTO_TABLE[(MPQ_HASH_KEY2_MIX + (key & 0xFF)) as usize])
            .0;

        let clear = BE::read_u32(&data[pos..pos + 4]);
        let word = clear ^ key.overflowing_add(key_secondary).0;
        LE::write_u32(&mut data[pos..pos + 4], word);

        key = ((!key << 0x15).overflowing_add(0x1111_1111).0) | (key >> 0x0B);
        key_secondary = clear
            .overflowing_add(key_secondary)
            .0
            .overflowing_add(key_secondary << 5)
            .0
            .overflowing_add(3)
            .0;
    }
}
