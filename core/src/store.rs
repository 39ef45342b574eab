//! On-disk management of encrypted configuration artifacts
//!
//! The store owns a single managed directory. Whatever comes in, only the
//! encrypted form is ever persisted there; plaintext exists on disk solely as
//! the transient runtime copy handed to the client binary.

use crate::{cipher, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File name of the primary configuration artifact.
pub const PRIMARY_ARTIFACT: &str = "frpc.toml.enc";

/// Extension marking a stored (encrypted) artifact.
const ARTIFACT_EXT: &str = ".toml.enc";

/// Name of the client executable installed into the storage root.
#[cfg(windows)]
pub const CLIENT_BINARY: &str = "frpc.exe";
#[cfg(not(windows))]
pub const CLIENT_BINARY: &str = "frpc";

/// Store of encrypted configuration artifacts under a managed root.
#[derive(Debug)]
pub struct ConfigStore {
    root: PathBuf,
    key: Vec<u8>,
    /// Where transient plaintext copies are materialized; never inside root.
    scratch: PathBuf,
    /// Cached artifact listing; refreshed by every mutating operation.
    listing: Mutex<Vec<String>>,
}

impl ConfigStore {
    /// Default storage root, following the platform config-dir convention.
    pub fn default_root() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("frpc-panel")
    }

    /// Open (creating if needed) a store at `root` using the shared key.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_key(root, cipher::SHARED_KEY)
    }

    /// Open a store with an explicit key. The root is created with
    /// owner-only permissions.
    pub fn open_with_key(root: impl Into<PathBuf>, key: &[u8]) -> Result<Self> {
        let root = root.into();

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            if !root.exists() {
                fs::DirBuilder::new()
                    .recursive(true)
                    .mode(0o700)
                    .create(&root)?;
            }
        }
        #[cfg(not(unix))]
        fs::create_dir_all(&root)?;

        let store = Self {
            root,
            key: key.to_vec(),
            scratch: std::env::temp_dir(),
            listing: Mutex::new(Vec::new()),
        };
        store.refresh_listing()?;
        Ok(store)
    }

    /// Use `dir` instead of the platform temp dir for transient plaintext
    /// copies.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch = dir.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, name: &str) -> PathBuf {
        if name.ends_with(ARTIFACT_EXT) {
            self.root.join(name)
        } else {
            self.root.join(format!("{}{}", name, ARTIFACT_EXT))
        }
    }

    /// Adopt raw file content as the primary artifact.
    ///
    /// Content that already decrypts under the shared key is persisted
    /// verbatim; anything else is treated as plaintext and encrypted first.
    /// A plaintext document that happens to be valid base64 of a decryptable
    /// blob would be misclassified as encrypted; in practice the TOML syntax
    /// of real configs never base64-decodes.
    pub fn adopt(&self, raw: &[u8]) -> Result<PathBuf> {
        self.adopt_as(PRIMARY_ARTIFACT, raw)
    }

    /// Adopt raw content under an arbitrary artifact name.
    pub fn adopt_as(&self, name: &str, raw: &[u8]) -> Result<PathBuf> {
        let path = self.artifact_path(name);

        let already_encrypted = std::str::from_utf8(raw)
            .ok()
            .map(|text| cipher::decrypt(text, &self.key).is_ok())
            .unwrap_or(false);

        if already_encrypted {
            log::info!("adopting already-encrypted config as {}", path.display());
            write_file(&path, raw)?;
        } else {
            log::info!("adopting plaintext config as {}", path.display());
            let encrypted = cipher::encrypt(raw, &self.key)?;
            write_file(&path, encrypted.as_bytes())?;
        }

        self.refresh_listing()?;
        Ok(path)
    }

    /// Adopt the content of an existing file (the "load config" entry point).
    pub fn adopt_file(&self, source: &Path) -> Result<PathBuf> {
        let raw = fs::read(source).map_err(|e| Error::ConfigRead {
            path: source.to_path_buf(),
            source: e,
        })?;
        self.adopt(&raw)
    }

    /// Replace the content of a named artifact. Same classification rules
    /// as [`adopt`]; fails if the artifact does not exist yet.
    pub fn modify(&self, name: &str, raw: &[u8]) -> Result<PathBuf> {
        let path = self.artifact_path(name);
        if !path.exists() {
            return Err(Error::not_found(format!("no artifact named '{}'", name)));
        }
        self.adopt_as(name, raw)
    }

    /// Delete a named artifact and refresh the listing.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.artifact_path(name);
        if !path.exists() {
            return Err(Error::not_found(format!("no artifact named '{}'", name)));
        }
        fs::remove_file(&path)?;
        self.refresh_listing()?;
        Ok(())
    }

    /// Current artifact names (without the `.toml.enc` suffix), sorted.
    pub fn list(&self) -> Vec<String> {
        self.listing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn refresh_listing(&self) -> Result<()> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(stem) = name.strip_suffix(ARTIFACT_EXT) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        *self.listing.lock().unwrap_or_else(|e| e.into_inner()) = names;
        Ok(())
    }

    /// Decrypt a stored artifact into a transient plaintext file in the
    /// platform temp dir and return its path. The caller owns cleanup;
    /// removal failure later is non-fatal by design.
    pub fn materialize_plaintext(&self, name: &str) -> Result<PathBuf> {
        let path = self.artifact_path(name);
        let blob = fs::read_to_string(&path).map_err(|e| Error::ConfigRead {
            path: path.clone(),
            source: e,
        })?;

        // Configuration documents are UTF-8 TOML; reject binary garbage here
        // rather than handing it to the client.
        let plaintext = cipher::decrypt_text(&blob, &self.key)?;

        fs::create_dir_all(&self.scratch).map_err(|e| Error::ConfigWrite {
            path: self.scratch.clone(),
            source: e,
        })?;
        let transient = self
            .scratch
            .join(format!("frpc-panel-{}.toml", uuid::Uuid::new_v4()));
        write_file(&transient, plaintext.as_bytes())?;
        Ok(transient)
    }

    /// Install the external client executable into the storage root with
    /// owner-execute permission, returning its path.
    pub fn install_binary(&self, payload: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(CLIENT_BINARY);
        write_file(&path, payload)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o700);
            fs::set_permissions(&path, perms)?;
        }

        Ok(path)
    }

    /// Path where the installed client executable lives.
    pub fn binary_path(&self) -> PathBuf {
        self.root.join(CLIENT_BINARY)
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content).map_err(|e| Error::ConfigWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)
            .map_err(|e| Error::ConfigWrite {
                path: path.to_path_buf(),
                source: e,
            })?
            .permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms).map_err(|e| Error::ConfigWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::SHARED_KEY;
    use tempfile::tempdir;

    const SAMPLE: &str =
        "serverAddr = \"203.0.113.5\"\nserverPort = 7000\n\n[auth]\ntoken = \"secret\"\n";

    #[test]
    fn test_adopt_plaintext_persists_encrypted() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("store")).unwrap();

        let path = store.adopt(SAMPLE.as_bytes()).unwrap();
        assert_eq!(path.file_name().unwrap(), PRIMARY_ARTIFACT);

        let stored = fs::read_to_string(&path).unwrap();
        assert_ne!(stored, SAMPLE);
        let decrypted = cipher::decrypt(&stored, SHARED_KEY).unwrap();
        assert_eq!(decrypted, SAMPLE.as_bytes());
    }

    #[test]
    fn test_adopt_encrypted_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("store")).unwrap();

        let path = store.adopt(SAMPLE.as_bytes()).unwrap();
        let first = fs::read(&path).unwrap();

        // Re-importing the stored ciphertext must keep it byte-identical
        store.adopt(&first).unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_materialize_plaintext_roundtrip() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("store")).unwrap();

        store.adopt(SAMPLE.as_bytes()).unwrap();
        let transient = store.materialize_plaintext(PRIMARY_ARTIFACT).unwrap();

        // Written outside the managed root, content exactly the document
        assert!(!transient.starts_with(store.root()));
        assert_eq!(fs::read_to_string(&transient).unwrap(), SAMPLE);

        fs::remove_file(transient).unwrap();
    }

    #[test]
    fn test_materialize_uses_scratch_dir() {
        let dir = tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        let store = ConfigStore::open(dir.path().join("store"))
            .unwrap()
            .with_scratch_dir(&scratch);

        store.adopt(SAMPLE.as_bytes()).unwrap();
        let transient = store.materialize_plaintext(PRIMARY_ARTIFACT).unwrap();
        assert!(transient.starts_with(&scratch));
        assert_eq!(fs::read_to_string(&transient).unwrap(), SAMPLE);
    }

    #[test]
    fn test_materialize_rejects_non_utf8_plaintext() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("store")).unwrap();

        store.adopt(&[0xff, 0xfe, 0x01]).unwrap();
        let err = store.materialize_plaintext(PRIMARY_ARTIFACT).unwrap_err();
        assert!(matches!(err, Error::Decrypt(_)));
    }

    #[test]
    fn test_materialize_missing_artifact() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("store")).unwrap();

        let err = store.materialize_plaintext("absent").unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_listing_refreshed_by_mutations() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("store")).unwrap();
        assert!(store.list().is_empty());

        store.adopt(SAMPLE.as_bytes()).unwrap();
        store.adopt_as("backup", SAMPLE.as_bytes()).unwrap();
        assert_eq!(store.list(), vec!["backup".to_string(), "frpc".to_string()]);

        store.modify("backup", b"serverAddr = \"other\"\n").unwrap();
        assert_eq!(store.list().len(), 2);

        store.delete("backup").unwrap();
        assert_eq!(store.list(), vec!["frpc".to_string()]);

        assert!(matches!(store.delete("backup"), Err(Error::NotFound(_))));
        assert!(matches!(
            store.modify("backup", b"x"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_adopt_file_missing_source() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("store")).unwrap();

        let err = store.adopt_file(Path::new("/nonexistent/frpc.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_install_binary_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("store")).unwrap();

        let path = store.install_binary(b"#!/bin/sh\nexit 0\n").unwrap();
        assert_eq!(path, store.binary_path());
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn test_root_created_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let root = dir.path().join("store");
        let store = ConfigStore::open(&root).unwrap();
        let mode = fs::metadata(store.root()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
