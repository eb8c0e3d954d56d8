//! AES-256 page decryption
//!
//! Pages are encrypted with one key/IV pair per chapter. CBC with PKCS#7
//! padding is the default; CTR is selectable through `download.cipher_mode`.

use crate::error::{DecryptionError, ExtractionError};
use aes::Aes256;
use aes::cipher::{
    BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher, block_padding::Pkcs7,
};
use serde::{Deserialize, Serialize};

type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;
/// AES-256 key length in bytes
pub const KEY_LEN: usize = 32;
/// IV length in bytes
pub const IV_LEN: usize = 16;

/// Block cipher mode applied to page bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherMode {
    /// AES-256-CBC with PKCS#7 padding
    #[default]
    Cbc,
    /// AES-256-CTR, 128-bit big-endian counter, no padding
    Ctr,
}

/// Key and IV shared by every page of a chapter
#[derive(Clone, PartialEq, Eq)]
pub struct CipherMaterial {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl CipherMaterial {
    /// Build from raw bytes
    pub fn new(key: [u8; KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self { key, iv }
    }

    /// Decode a 64-character hex key and a 32-character hex IV
    pub fn from_hex(key_hex: &str, iv_hex: &str) -> Result<Self, ExtractionError> {
        Ok(Self {
            key: decode_fixed(key_hex, "key")?,
            iv: decode_fixed(iv_hex, "iv")?,
        })
    }

    /// Raw key bytes
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Raw IV bytes
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }
}

impl std::fmt::Debug for CipherMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherMaterial")
            .field("key", &redacted_hex(&self.key))
            .field("iv", &redacted_hex(&self.iv))
            .finish()
    }
}

/// First four hex digits followed by an ellipsis, for logs
pub(crate) fn redacted_hex(bytes: &[u8]) -> String {
    let prefix: String = hex::encode(bytes).chars().take(4).collect();
    format!("{prefix}…")
}

fn decode_fixed<const N: usize>(
    hex_str: &str,
    what: &'static str,
) -> Result<[u8; N], ExtractionError> {
    let bytes = hex::decode(hex_str).map_err(|e| ExtractionError::InvalidHex {
        what,
        reason: e.to_string(),
    })?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| ExtractionError::InvalidHex {
            what,
            reason: format!("expected {N} bytes, got {len}"),
        })
}

/// Decrypt a full page buffer in one shot
pub fn decrypt(
    mode: CipherMode,
    material: &CipherMaterial,
    data: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    match mode {
        CipherMode::Cbc => {
            if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
                return Err(DecryptionError::InvalidLength { len: data.len() });
            }
            let cipher = Aes256CbcDec::new_from_slices(&material.key, &material.iv)
                .map_err(|_| DecryptionError::InvalidKeyLength)?;
            cipher
                .decrypt_padded_vec_mut::<Pkcs7>(data)
                .map_err(|_| DecryptionError::BadPadding)
        }
        CipherMode::Ctr => apply_ctr(material, data),
    }
}

/// Encrypt a buffer with the same parameters [`decrypt`] expects
///
/// Not used by the download path; handy for building fixtures.
pub fn encrypt(
    mode: CipherMode,
    material: &CipherMaterial,
    plaintext: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    match mode {
        CipherMode::Cbc => {
            let cipher = Aes256CbcEnc::new_from_slices(&material.key, &material.iv)
                .map_err(|_| DecryptionError::InvalidKeyLength)?;
            Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
        }
        CipherMode::Ctr => apply_ctr(material, plaintext),
    }
}

fn apply_ctr(material: &CipherMaterial, data: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    let mut cipher = Aes256Ctr::new_from_slices(&material.key, &material.iv)
        .map_err(|_| DecryptionError::InvalidKeyLength)?;
    let mut buf = data.to_vec();
    cipher.apply_keystream(&mut buf);
    Ok(buf)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
    const IV_HEX: &str = "f0e0d0c0b0a090807060504030201000";

    fn material() -> CipherMaterial {
        CipherMaterial::from_hex(KEY_HEX, IV_HEX).unwrap()
    }

    #[test]
    fn from_hex_decodes_exact_lengths() {
        let m = material();

        assert_eq!(m.key()[0], 0x00);
        assert_eq!(m.key()[31], 0x1f);
        assert_eq!(m.iv()[0], 0xf0);
        assert_eq!(m.iv()[15], 0x00);
    }

    #[test]
    fn from_hex_rejects_short_key() {
        let err = CipherMaterial::from_hex(&KEY_HEX[..62], IV_HEX).unwrap_err();

        assert!(matches!(err, ExtractionError::InvalidHex { what: "key", .. }));
    }

    #[test]
    fn from_hex_rejects_iv_of_key_length() {
        let err = CipherMaterial::from_hex(KEY_HEX, KEY_HEX).unwrap_err();

        assert!(matches!(err, ExtractionError::InvalidHex { what: "iv", .. }));
    }

    #[test]
    fn cbc_round_trip_restores_plaintext() {
        let plaintext = b"RIFF\x00\x00\x00\x00WEBPVP8 not really an image but close enough";

        let encrypted = encrypt(CipherMode::Cbc, &material(), plaintext).unwrap();
        assert_eq!(encrypted.len() % BLOCK_SIZE, 0);
        assert_ne!(&encrypted[..plaintext.len().min(encrypted.len())], &plaintext[..]);

        let decrypted = decrypt(CipherMode::Cbc, &material(), &encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn cbc_block_aligned_plaintext_gains_full_padding_block() {
        let plaintext = [0x42u8; 32];

        let encrypted = encrypt(CipherMode::Cbc, &material(), &plaintext).unwrap();

        assert_eq!(encrypted.len(), 48);
        assert_eq!(
            decrypt(CipherMode::Cbc, &material(), &encrypted).unwrap(),
            plaintext
        );
    }

    #[test]
    fn cbc_rejects_unaligned_ciphertext() {
        let err = decrypt(CipherMode::Cbc, &material(), &[0u8; 17]).unwrap_err();

        assert!(matches!(err, DecryptionError::InvalidLength { len: 17 }));
    }

    #[test]
    fn cbc_rejects_empty_ciphertext() {
        let err = decrypt(CipherMode::Cbc, &material(), &[]).unwrap_err();

        assert!(matches!(err, DecryptionError::InvalidLength { len: 0 }));
    }

    #[test]
    fn cbc_wrong_key_never_yields_plaintext() {
        let encrypted = encrypt(CipherMode::Cbc, &material(), b"page bytes").unwrap();
        let other = CipherMaterial::new([0xAA; KEY_LEN], *material().iv());

        match decrypt(CipherMode::Cbc, &other, &encrypted) {
            Ok(bytes) => assert_ne!(bytes, b"page bytes"),
            Err(e) => assert!(matches!(e, DecryptionError::BadPadding)),
        }
    }

    #[test]
    fn ctr_round_trip_keeps_length() {
        let plaintext = b"seventeen bytes!!";

        let encrypted = encrypt(CipherMode::Ctr, &material(), plaintext).unwrap();
        assert_eq!(encrypted.len(), plaintext.len());

        let decrypted = decrypt(CipherMode::Ctr, &material(), &encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let shown = format!("{:?}", material());

        assert!(!shown.contains(KEY_HEX));
        assert!(!shown.contains(IV_HEX));
        assert!(shown.contains("0001…"));
    }
}
