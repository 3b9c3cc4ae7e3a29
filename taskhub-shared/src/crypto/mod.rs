/// Encryption of sensitive columns.
///
/// - [`card`]: AES-CBC encryption of stored card numbers

pub mod card;
