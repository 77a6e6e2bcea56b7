//! Key material loading: RSA private keys, RSA public keys and X.509 certificates.

pub mod certificate;
pub mod loader;

pub use certificate::Certificate;
pub use loader::{
    load_certificate, load_certificate_chain, load_private_key, load_public_key, read_file,
    read_pem_file, KeyMaterial,
};
pub use rsa::{RsaPrivateKey, RsaPublicKey};
