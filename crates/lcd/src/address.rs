// Path: crates/lcd/src/address.rs
use bech32::{FromBase32, ToBase32, Variant};
use govwatch_types::error::AddressError;

/// The human-readable-part suffix carried by validator-operator addresses.
pub const OPERATOR_SUFFIX: &str = "valoper";

/// Converts a validator-operator address (`cosmosvaloper1...`) to the account
/// address of the same key (`cosmos1...`).
///
/// Governance votes are keyed by account address. The conversion keeps the
/// 20 or 32 byte payload and swaps the prefix.
pub fn operator_to_account(address: &str) -> Result<String, AddressError> {
    let (hrp, data, variant) = bech32::decode(address).map_err(|e| AddressError::Bech32 {
        address: address.to_string(),
        reason: e.to_string(),
    })?;
    if variant != Variant::Bech32 {
        return Err(AddressError::Bech32 {
            address: address.to_string(),
            reason: "expected bech32, found bech32m".into(),
        });
    }
    let account_hrp = match hrp.strip_suffix(OPERATOR_SUFFIX) {
        Some(prefix) if !prefix.is_empty() => prefix.to_string(),
        _ => {
            return Err(AddressError::NotOperatorAddress {
                address: address.to_string(),
                hrp,
            })
        }
    };
    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| AddressError::Bech32 {
        address: address.to_string(),
        reason: e.to_string(),
    })?;
    if bytes.len() != 20 && bytes.len() != 32 {
        return Err(AddressError::InvalidLength {
            address: address.to_string(),
            len: bytes.len(),
        });
    }
    bech32::encode(&account_hrp, bytes.to_base32(), Variant::Bech32).map_err(|e| {
        AddressError::Bech32 {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_byte_operator_address() {
        let account =
            operator_to_account("cosmosvaloper1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc56kct20").unwrap();
        assert_eq!(account, "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu");
    }

    #[test]
    fn test_thirty_two_byte_operator_address() {
        let account = operator_to_account(
            "osmovaloper1v3jkvemgd94xkmrddehhqutjwd682anh0puh57mu04l8lqyps2psydujlt",
        )
        .unwrap();
        assert_eq!(
            account,
            "osmo1v3jkvemgd94xkmrddehhqutjwd682anh0puh57mu04l8lqyps2ps4r4wdw"
        );
    }

    #[test]
    fn test_account_address_is_rejected() {
        let err = operator_to_account("cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu").unwrap_err();
        assert!(matches!(err, AddressError::NotOperatorAddress { ref hrp, .. } if hrp == "cosmos"));
    }

    #[test]
    fn test_bad_checksum() {
        let err =
            operator_to_account("cosmosvaloper1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc56kct21").unwrap_err();
        assert!(matches!(err, AddressError::Bech32 { .. }));
    }

    #[test]
    fn test_unexpected_payload_length() {
        let err = operator_to_account("cosmosvaloper1qypqxpq9qcrsszg2pvxq6rs0zqfej28t").unwrap_err();
        assert!(matches!(err, AddressError::InvalidLength { len: 16, .. }));
    }
}
