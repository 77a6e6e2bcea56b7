//! Key material loading against generated PEM fixtures.

mod common;

use common::{fixture, fixture_path};
use jwt_tool::keys::{
    load_certificate, load_certificate_chain, load_private_key, load_public_key, read_pem_file,
    KeyMaterial,
};
use jwt_tool::TokenError;

#[test]
fn test_private_key_containers() {
    let pkcs1 = load_private_key(&fixture("signing.key")).unwrap();
    let pkcs8 = load_private_key(&fixture("signing.pkcs8.key")).unwrap();
    assert_eq!(pkcs1, pkcs8);
    assert_eq!(pkcs1.to_public_key(), load_public_key(&fixture("signing.pub")).unwrap());
}

#[test]
fn test_pkcs1_public_key() {
    let pkcs1 = load_public_key(&fixture("signing.rsa.pub")).unwrap();
    assert_eq!(pkcs1, load_public_key(&fixture("signing.pub")).unwrap());

    match KeyMaterial::from_pem(&fixture("signing.rsa.pub")).unwrap() {
        KeyMaterial::PublicKey(key) => assert_eq!(key, pkcs1),
        other => panic!("expected a public key, got {other:?}"),
    }
}

#[test]
fn test_malformed_pem_private_key() {
    let err = load_private_key(b"-----BEGIN NOTHING").unwrap_err();
    assert!(matches!(err, TokenError::MalformedEncoding { .. }));
    assert_eq!(err.code(), "MALFORMED_ENCODING");
}

#[test]
fn test_ec_material_is_wrong_key_type() {
    for name in ["ec.key", "ec.pub"] {
        let err = KeyMaterial::from_pem(&fixture(name)).unwrap_err();
        assert!(matches!(err, TokenError::WrongKeyType { .. }), "{name}");
    }
    let err = load_certificate(&fixture("ec.crt")).unwrap_err();
    assert!(matches!(err, TokenError::WrongKeyType { .. }));
    let err = load_public_key(&fixture("ec.pub")).unwrap_err();
    assert!(matches!(err, TokenError::WrongKeyType { .. }));
}

#[test]
fn test_certificate_serials() {
    assert_eq!(load_certificate(&fixture("signing.crt")).unwrap().serial_number(), "12345");
    assert_eq!(load_certificate(&fixture("other.crt")).unwrap().serial_number(), "67890");
}

#[test]
fn test_single_loader_takes_first_block() {
    let cert = load_certificate(&fixture("chain.pem")).unwrap();
    assert_eq!(cert.serial_number(), "12345");
}

#[test]
fn test_chain_order() {
    let chain = load_certificate_chain(&fixture("chain.pem")).unwrap();
    let serials: Vec<_> = chain.iter().map(|c| c.serial_number().to_string()).collect();
    assert_eq!(serials, ["12345", "67890"]);

    let err = load_certificate_chain(b"").unwrap_err();
    assert!(matches!(err, TokenError::MalformedEncoding { .. }));
}

#[test]
fn test_read_pem_file() {
    let bytes = read_pem_file(fixture_path("signing.crt")).unwrap();
    assert!(bytes.starts_with(b"-----BEGIN CERTIFICATE-----"));

    let err = read_pem_file(fixture_path("absent.pem")).unwrap_err();
    assert!(matches!(err, TokenError::Io { .. }));
}
