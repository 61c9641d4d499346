//! At-rest encryption of the store file.
//!
//! # Responsibility
//! - Seal `bookmarks.db` into `bookmarks.db.enc` and back with AES-256-CBC.
//! - Detect a wrong password through a digest of the plaintext.
//!
//! # Invariants
//! - The source file is removed only after the destination is fully written
//!   and synced.
//! - Every sealed file carries its own random salt and IV.
//!
//! Sealed layout: `MAGIC | iterations (u32 LE) | salt | iv | sha256(plain) | ciphertext`.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use log::info;
use rand::Rng;
use sha2::{Digest, Sha256};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const DEFAULT_ITERATIONS: u32 = 8;

const MAGIC: &[u8; 8] = b"MKSTENC1";
const SALT_LEN: usize = 32;
const IV_LEN: usize = 16;
const DIGEST_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + 4 + SALT_LEN + IV_LEN + DIGEST_LEN;

#[derive(Debug)]
pub enum CryptoError {
    EmptyPassword,
    InvalidIterations,
    /// Input is not a sealed store or is truncated.
    Malformed(String),
    /// Decryption or digest check failed.
    WrongPassword,
    Io { path: PathBuf, source: std::io::Error },
}

impl Display for CryptoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPassword => write!(f, "password cannot be empty"),
            Self::InvalidIterations => write!(f, "iterations must be at least 1"),
            Self::Malformed(message) => write!(f, "not a locked markstash store: {message}"),
            Self::WrongPassword => write!(f, "decryption failed: wrong password or corrupt file"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for CryptoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Derives the AES key: SHA-256 over `password || salt`, re-hashed until
/// `iterations` rounds have run.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut key = Sha256::new()
        .chain_update(password)
        .chain_update(salt)
        .finalize();
    for _ in 1..iterations {
        key = Sha256::digest(key);
    }
    key.into()
}

pub fn seal(plain: &[u8], password: &str, iterations: u32) -> Result<Vec<u8>, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::EmptyPassword);
    }
    if iterations == 0 {
        return Err(CryptoError::InvalidIterations);
    }

    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    let mut rng = rand::thread_rng();
    rng.fill(&mut salt[..]);
    rng.fill(&mut iv[..]);

    let key = derive_key(password.as_bytes(), &salt, iterations);
    let digest = Sha256::digest(plain);
    let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plain);

    let mut sealed = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    sealed.extend_from_slice(MAGIC);
    sealed.extend_from_slice(&iterations.to_le_bytes());
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&iv);
    sealed.extend_from_slice(&digest);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

pub fn open(sealed: &[u8], password: &str) -> Result<Vec<u8>, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::EmptyPassword);
    }
    if sealed.len() < HEADER_LEN {
        return Err(CryptoError::Malformed(format!(
            "expected at least {HEADER_LEN} bytes, found {}",
            sealed.len()
        )));
    }

    let (magic, rest) = sealed.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(CryptoError::Malformed("missing header".into()));
    }
    let (iterations, rest) = rest.split_at(4);
    let (salt, rest) = rest.split_at(SALT_LEN);
    let (iv, rest) = rest.split_at(IV_LEN);
    let (digest, ciphertext) = rest.split_at(DIGEST_LEN);

    let mut iterations_bytes = [0u8; 4];
    iterations_bytes.copy_from_slice(iterations);
    let iterations = u32::from_le_bytes(iterations_bytes);
    if iterations == 0 {
        return Err(CryptoError::Malformed("zero key derivation rounds".into()));
    }
    let mut iv_bytes = [0u8; IV_LEN];
    iv_bytes.copy_from_slice(iv);

    let key = derive_key(password.as_bytes(), salt, iterations);
    let plain = Aes256CbcDec::new(&key.into(), &iv_bytes.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::WrongPassword)?;

    if Sha256::digest(&plain).as_slice() != digest {
        return Err(CryptoError::WrongPassword);
    }
    Ok(plain)
}

/// Encrypts `source` into `dest`, then removes `source`.
pub fn lock_file(
    source: &Path,
    dest: &Path,
    password: &str,
    iterations: u32,
) -> Result<(), CryptoError> {
    let plain = read(source)?;
    let sealed = seal(&plain, password, iterations)?;
    write_then_remove(dest, &sealed, source)?;
    info!("event=store_lock module=cli status=ok iterations={iterations}");
    Ok(())
}

/// Decrypts `source` into `dest`, then removes `source`.
pub fn unlock_file(source: &Path, dest: &Path, password: &str) -> Result<(), CryptoError> {
    let sealed = read(source)?;
    let plain = open(&sealed, password)?;
    write_then_remove(dest, &plain, source)?;
    info!("event=store_unlock module=cli status=ok");
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>, CryptoError> {
    fs::read(path).map_err(|source| CryptoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_then_remove(dest: &Path, bytes: &[u8], source: &Path) -> Result<(), CryptoError> {
    let partial = partial_path(dest);
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| CryptoError::Io { path, source }
    };

    let mut file = File::create(&partial).map_err(io_err(&partial))?;
    file.write_all(bytes).map_err(io_err(&partial))?;
    file.sync_all().map_err(io_err(&partial))?;
    drop(file);

    fs::rename(&partial, dest).map_err(io_err(dest))?;
    fs::remove_file(source).map_err(io_err(source))
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_derivation_depends_on_every_input() {
        let base = derive_key(b"secret", b"salt", 8);
        assert_eq!(base, derive_key(b"secret", b"salt", 8));
        assert_ne!(base, derive_key(b"secret", b"salt", 9));
        assert_ne!(base, derive_key(b"secret", b"pepper", 8));
        assert_ne!(base, derive_key(b"Secret", b"salt", 8));
    }

    #[test]
    fn single_round_is_plain_sha256_of_password_and_salt() {
        let expected: [u8; 32] = Sha256::digest(b"pwsalt").into();
        assert_eq!(derive_key(b"pw", b"salt", 1), expected);
    }

    #[test]
    fn sealed_bytes_open_with_the_right_password_only() {
        let sealed = seal(b"SQLite format 3\0rows", "hunter2", 3).unwrap();
        assert_eq!(&sealed[..MAGIC.len()], MAGIC);
        assert_eq!(open(&sealed, "hunter2").unwrap(), b"SQLite format 3\0rows");
        assert!(matches!(
            open(&sealed, "hunter3"),
            Err(CryptoError::WrongPassword)
        ));
    }

    #[test]
    fn each_seal_uses_fresh_salt_and_iv() {
        let first = seal(b"same", "pw", 1).unwrap();
        let second = seal(b"same", "pw", 1).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn rejects_empty_password_zero_rounds_and_garbage() {
        assert!(matches!(seal(b"x", "", 1), Err(CryptoError::EmptyPassword)));
        assert!(matches!(seal(b"x", "pw", 0), Err(CryptoError::InvalidIterations)));
        assert!(matches!(open(b"short", "pw"), Err(CryptoError::Malformed(_))));
        assert!(matches!(
            open(&[0u8; HEADER_LEN + 16], "pw"),
            Err(CryptoError::Malformed(_))
        ));
    }

    #[test]
    fn lock_then_unlock_restores_file_and_removes_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("bookmarks.db");
        let enc = tmp.path().join("bookmarks.db.enc");
        fs::write(&db, b"store contents").unwrap();

        lock_file(&db, &enc, "pw", 2).unwrap();
        assert!(!db.exists());
        assert!(enc.exists());

        assert!(matches!(
            unlock_file(&enc, &db, "nope"),
            Err(CryptoError::WrongPassword)
        ));
        assert!(enc.exists());
        assert!(!db.exists());

        unlock_file(&enc, &db, "pw").unwrap();
        assert!(!enc.exists());
        assert_eq!(fs::read(&db).unwrap(), b"store contents");
    }
}
