//! Turns an encrypted seed from the outside world into a stored one.

use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::RsaPrivateKey;
use zeroize::Zeroizing;

use crate::crypto::asymmetric::decrypt_oaep_sha256;
use crate::crypto::integrity::sha256_hex;
use crate::seed::store::SeedStore;
use crate::seed::{Seed, SeedError};

/// The only writer of seed material. Nothing reaches the store until the
/// decrypted value has been parsed into a [`Seed`].
pub struct SeedProvisioner<'a, S: SeedStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SeedStore + ?Sized> SeedProvisioner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn provision(&self, encrypted_seed_b64: &str, private_key: &RsaPrivateKey) -> Result<(), SeedError> {
        let ciphertext = STANDARD
            .decode(encrypted_seed_b64.trim().as_bytes())
            .map_err(|e| SeedError::MalformedInput(format!("{e}")))?;
        let plaintext = Zeroizing::new(decrypt_oaep_sha256(private_key, &ciphertext)?);
        let text = std::str::from_utf8(&plaintext).map_err(|e| SeedError::Encoding(format!("{e}")))?;
        let seed = Seed::parse(text)?;

        self.store.write(&seed)?;
        let mut fingerprint = sha256_hex(seed.as_bytes());
        fingerprint.truncate(8);
        tracing::info!(%fingerprint, "seed provisioned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SeedProvisioner;
    use crate::crypto::asymmetric::{encrypt_oaep_sha256, CryptoError};
    use crate::seed::store::{MemorySeedStore, SeedStore};
    use crate::seed::{Seed, SeedError};
    use crate::testdata;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts writes so tests can prove invalid input never reaches storage.
    #[derive(Default)]
    struct RecordingStore {
        inner: MemorySeedStore,
        writes: AtomicUsize,
    }

    impl SeedStore for RecordingStore {
        fn write(&self, seed: &Seed) -> Result<(), SeedError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.write(seed)
        }

        fn read(&self) -> Result<Seed, SeedError> {
            self.inner.read()
        }

        fn exists(&self) -> bool {
            self.inner.exists()
        }
    }

    fn encrypt_for_service(plaintext: &[u8]) -> String {
        let ciphertext = encrypt_oaep_sha256(&testdata::service_public_key(), plaintext).expect("encrypt");
        STANDARD.encode(ciphertext)
    }

    #[test]
    fn provisions_externally_encrypted_seed() {
        let store = RecordingStore::default();
        let encrypted = testdata::text_fixture("encrypted_seed.b64");
        SeedProvisioner::new(&store)
            .provision(&encrypted, &testdata::service_private_key())
            .expect("provision");
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(store.read().expect("read").as_hex(), testdata::PROVISIONED_SEED);
    }

    #[test]
    fn reprovisioning_overwrites() {
        let store = RecordingStore::default();
        let key = testdata::service_private_key();
        let provisioner = SeedProvisioner::new(&store);
        provisioner.provision(&encrypt_for_service("a".repeat(64).as_bytes()), &key).expect("first");
        provisioner.provision(&encrypt_for_service("b".repeat(64).as_bytes()), &key).expect("second");
        assert_eq!(store.read().expect("read").as_hex(), "b".repeat(64));
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn short_seed_is_never_written() {
        let store = RecordingStore::default();
        let encrypted = testdata::text_fixture("encrypted_short_seed.b64");
        let err = SeedProvisioner::new(&store)
            .provision(&encrypted, &testdata::service_private_key())
            .unwrap_err();
        assert!(matches!(err, SeedError::InvalidSeed(_)));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert!(!store.exists());
    }

    #[test]
    fn long_seed_is_never_written() {
        let store = RecordingStore::default();
        let err = SeedProvisioner::new(&store)
            .provision(&encrypt_for_service("a".repeat(65).as_bytes()), &testdata::service_private_key())
            .unwrap_err();
        assert!(matches!(err, SeedError::InvalidSeed(_)));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_reprovisioning_keeps_previous_seed() {
        let store = RecordingStore::default();
        let key = testdata::service_private_key();
        let provisioner = SeedProvisioner::new(&store);
        provisioner.provision(&encrypt_for_service("a".repeat(64).as_bytes()), &key).expect("first");
        provisioner.provision(&encrypt_for_service(b"too-short"), &key).unwrap_err();
        assert_eq!(store.read().expect("read").as_hex(), "a".repeat(64));
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bad_base64_is_malformed_input() {
        let store = RecordingStore::default();
        let err = SeedProvisioner::new(&store)
            .provision("%%% not base64 %%%", &testdata::service_private_key())
            .unwrap_err();
        assert!(matches!(err, SeedError::MalformedInput(_)));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn wrong_key_is_a_decryption_error() {
        let store = RecordingStore::default();
        let encrypted = testdata::text_fixture("encrypted_seed.b64");
        let err = SeedProvisioner::new(&store)
            .provision(&encrypted, &testdata::signer_private_key())
            .unwrap_err();
        assert!(matches!(err, SeedError::Crypto(CryptoError::Decryption(_))));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let store = RecordingStore::default();
        let err = SeedProvisioner::new(&store)
            .provision(&encrypt_for_service(&[0xff; 64]), &testdata::service_private_key())
            .unwrap_err();
        assert!(matches!(err, SeedError::Encoding(_)));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }
}
