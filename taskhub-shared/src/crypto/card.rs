/// Card number encryption
///
/// Card numbers are stored in `balance.user_cards` as AES-CBC ciphertexts with
/// PKCS#7 padding. Key and IV come from the environment as hex strings. The IV
/// is fixed, so the same card always encrypts to the same bytes; card
/// de-duplication in the balance table compares ciphertexts and depends on
/// this.
///
/// AES-128, AES-192 and AES-256 are selected by key length (16, 24 or 32 bytes).
///
/// # Example
///
/// ```
/// use taskhub_shared::crypto::card::CardCipher;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cipher = CardCipher::from_hex(
///     "000102030405060708090a0b0c0d0e0f",
///     "0f0e0d0c0b0a09080706050403020100",
/// )?;
///
/// let encrypted = cipher.encrypt_card_number("4444333322221111");
/// assert_eq!(cipher.decrypt_card_number(&encrypted)?, "4444333322221111");
/// # Ok(())
/// # }
/// ```

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut, KeyIvInit,
};

/// AES block and IV size
pub const IV_LENGTH: usize = 16;

/// Error type for card encryption
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// Key or IV is not valid hex
    #[error("Invalid hex in {0}")]
    InvalidHex(&'static str),

    /// Key is not 16, 24 or 32 bytes
    #[error("Encryption key must be 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// IV is not 16 bytes
    #[error("IV must be 16 bytes, got {0}")]
    InvalidIvLength(usize),

    /// Ciphertext has bad padding or was produced with another key
    #[error("Failed to decrypt card number")]
    Decrypt,

    /// Plaintext is not UTF-8
    #[error("Decrypted card number is not valid UTF-8")]
    Encoding,
}

#[derive(Clone)]
enum Key {
    Aes128([u8; 16]),
    Aes192([u8; 24]),
    Aes256([u8; 32]),
}

/// Deterministic AES-CBC cipher for card numbers.
#[derive(Clone)]
pub struct CardCipher {
    key: Key,
    iv: [u8; IV_LENGTH],
}

impl std::fmt::Debug for CardCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits = match self.key {
            Key::Aes128(_) => 128,
            Key::Aes192(_) => 192,
            Key::Aes256(_) => 256,
        };
        write!(f, "CardCipher(AES-{}-CBC)", bits)
    }
}

impl CardCipher {
    /// Builds a cipher from raw key and IV bytes.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        let iv: [u8; IV_LENGTH] = iv
            .try_into()
            .map_err(|_| CryptoError::InvalidIvLength(iv.len()))?;

        let key = match key.len() {
            16 => Key::Aes128(key.try_into().map_err(|_| CryptoError::InvalidKeyLength(16))?),
            24 => Key::Aes192(key.try_into().map_err(|_| CryptoError::InvalidKeyLength(24))?),
            32 => Key::Aes256(key.try_into().map_err(|_| CryptoError::InvalidKeyLength(32))?),
            other => return Err(CryptoError::InvalidKeyLength(other)),
        };

        Ok(Self { key, iv })
    }

    /// Builds a cipher from the hex strings in `ENCRYPTION_KEY` and `IV`.
    pub fn from_hex(key_hex: &str, iv_hex: &str) -> Result<Self, CryptoError> {
        let key = hex::decode(key_hex.trim()).map_err(|_| CryptoError::InvalidHex("ENCRYPTION_KEY"))?;
        let iv = hex::decode(iv_hex.trim()).map_err(|_| CryptoError::InvalidHex("IV"))?;
        Self::new(&key, &iv)
    }

    /// Encrypts a card number. The output length is a multiple of 16.
    pub fn encrypt_card_number(&self, card_number: &str) -> Vec<u8> {
        let plaintext = card_number.as_bytes();
        let iv = GenericArray::from_slice(&self.iv);

        match &self.key {
            Key::Aes128(k) => cbc::Encryptor::<Aes128>::new(GenericArray::from_slice(k), iv)
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            Key::Aes192(k) => cbc::Encryptor::<Aes192>::new(GenericArray::from_slice(k), iv)
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            Key::Aes256(k) => cbc::Encryptor::<Aes256>::new(GenericArray::from_slice(k), iv)
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        }
    }

    /// Decrypts a stored card number.
    pub fn decrypt_card_number(&self, ciphertext: &[u8]) -> Result<String, CryptoError> {
        let iv = GenericArray::from_slice(&self.iv);

        let plaintext = match &self.key {
            Key::Aes128(k) => cbc::Decryptor::<Aes128>::new(GenericArray::from_slice(k), iv)
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            Key::Aes192(k) => cbc::Decryptor::<Aes192>::new(GenericArray::from_slice(k), iv)
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            Key::Aes256(k) => cbc::Decryptor::<Aes256>::new(GenericArray::from_slice(k), iv)
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        }
        .map_err(|_| CryptoError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Encoding)
    }

    /// Decrypts every stored card, failing on the first bad entry.
    pub fn decrypt_all(&self, cards: &[Vec<u8>]) -> Result<Vec<String>, CryptoError> {
        cards.iter().map(|c| self.decrypt_card_number(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_128: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const KEY_256: &str = "603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4";
    const IV: &str = "000102030405060708090a0b0c0d0e0f";

    #[test]
    fn test_round_trip_all_key_sizes() {
        let key_192 = "8e73b0f7da0e6452c810f32b809079e562f8ead2522c6b7b";
        for key in [KEY_128, key_192, KEY_256] {
            let cipher = CardCipher::from_hex(key, IV).unwrap();
            let encrypted = cipher.encrypt_card_number("5375414100001111");
            assert_eq!(encrypted.len() % 16, 0);
            assert_eq!(cipher.decrypt_card_number(&encrypted).unwrap(), "5375414100001111");
        }
    }

    #[test]
    fn test_encryption_is_deterministic() {
        let cipher = CardCipher::from_hex(KEY_256, IV).unwrap();
        assert_eq!(
            cipher.encrypt_card_number("4149499999999999"),
            cipher.encrypt_card_number("4149499999999999")
        );
        assert_ne!(
            cipher.encrypt_card_number("4149499999999999"),
            cipher.encrypt_card_number("4149499999999998")
        );
    }

    #[test]
    fn test_known_ciphertext() {
        // openssl enc -aes-128-cbc with the same key and IV
        let cipher = CardCipher::from_hex(KEY_128, IV).unwrap();
        let encrypted = cipher.encrypt_card_number("4444333322221111");
        assert_eq!(
            hex::encode(&encrypted),
            "b6760a06f43a054e85f53457b605bf2468366c32386c1291e270b8eb48d2df01"
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            CardCipher::from_hex("zz", IV).unwrap_err(),
            CryptoError::InvalidHex("ENCRYPTION_KEY")
        );
        assert_eq!(
            CardCipher::from_hex("00112233", IV).unwrap_err(),
            CryptoError::InvalidKeyLength(4)
        );
        assert_eq!(
            CardCipher::from_hex(KEY_128, "0011").unwrap_err(),
            CryptoError::InvalidIvLength(2)
        );
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let a = CardCipher::from_hex(KEY_128, IV).unwrap();
        let b = CardCipher::from_hex(KEY_256, IV).unwrap();

        let encrypted = a.encrypt_card_number("4444333322221111");
        assert!(b.decrypt_card_number(&encrypted).is_err());
        assert_eq!(a.decrypt_card_number(&[1, 2, 3]), Err(CryptoError::Decrypt));
    }

    #[test]
    fn test_decrypt_all() {
        let cipher = CardCipher::from_hex(KEY_128, IV).unwrap();
        let cards = vec![
            cipher.encrypt_card_number("1111"),
            cipher.encrypt_card_number("2222"),
        ];
        assert_eq!(cipher.decrypt_all(&cards).unwrap(), vec!["1111", "2222"]);
    }
}
