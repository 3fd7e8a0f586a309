//! Private key file interoperability with the `ssh-key` crate

use oracle_agent::key::{
    KeyError, KeyPair, format_public_key_line, parse_private_key_file, parse_public_key_line,
    read_private_key_file, serialize_private_key_file, write_private_key_file,
};
use ssh_key::private::{Ed25519Keypair, KeypairData};
use ssh_key::{LineEnding, PrivateKey, PublicKey};
use tempfile::TempDir;

fn seed(byte: u8) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[0] = byte;
    seed
}

#[test]
fn test_our_file_parses_with_ssh_key() {
    let pair = KeyPair::from_seed(&seed(1));
    let pem = serialize_private_key_file(pair.secret(), pair.public(), *b"0123");

    let parsed = PrivateKey::from_openssh(pem.as_bytes()).unwrap();
    assert!(!parsed.is_encrypted());
    let keypair = parsed.key_data().ed25519().unwrap();
    assert_eq!(keypair.private.to_bytes(), *pair.secret());
    assert_eq!(keypair.public.0, *pair.public());
    assert_eq!(parsed.comment(), "");
}

#[test]
fn test_ssh_key_file_parses_with_ours() {
    let keypair = Ed25519Keypair::from_seed(&seed(2));
    let private = PrivateKey::new(KeypairData::Ed25519(keypair.clone()), "ci signer").unwrap();
    let pem = private.to_openssh(LineEnding::LF).unwrap();

    let pair = parse_private_key_file(pem.as_bytes()).unwrap();
    assert_eq!(*pair.secret(), keypair.private.to_bytes());
    assert_eq!(*pair.public(), keypair.public.0);
}

#[test]
fn test_public_key_line_matches_ssh_key() {
    let pair = KeyPair::from_seed(&seed(3));
    let line = format_public_key_line(pair.public(), "oracle key");

    let public: PublicKey = line.parse().unwrap();
    assert_eq!(public.key_data().ed25519().unwrap().0, *pair.public());
    assert_eq!(public.comment(), "oracle key");
    assert_eq!(public.to_openssh().unwrap(), line);

    let (raw, comment) = parse_public_key_line(line.as_bytes()).unwrap();
    assert_eq!(&raw, pair.public());
    assert_eq!(comment, "oracle key");
}

#[test]
fn test_nonce_mismatch_rejected() {
    let pair = KeyPair::from_seed(&seed(1));
    let blob = oracle_agent::key::openssh::serialize_private_key_blob(
        pair.secret(),
        pair.public(),
        *b"0123",
    );
    let mut blob = blob.to_vec();
    blob[98] ^= 1;

    let err = oracle_agent::key::openssh::parse_private_key_blob(&blob).unwrap_err();
    assert!(matches!(err, KeyError::NonceMismatch));
}

#[test]
fn test_written_file_round_trips_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("id_ed25519");
    let pair = KeyPair::generate();

    write_private_key_file(&path, &pair).unwrap();
    let loaded = read_private_key_file(&path).unwrap();
    assert_eq!(loaded.secret(), pair.secret());

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(PrivateKey::from_openssh(&text).is_ok());
}
