//! Short-lived key files handed to `sui client --key-file`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::io::Write;
use std::path::Path;
use suiforge_core::Credentials;
use suiforge_core::error::ToolchainError;
use tempfile::NamedTempFile;

/// Ed25519 signature scheme flag in a Sui keystore entry.
const ED25519_FLAG: u8 = 0x00;

/// Turn raw key material into a single Sui keystore entry.
///
/// A 32-byte hex secret (optionally `0x`-prefixed) becomes
/// `base64(flag || secret)`. Anything else is assumed to already be an entry.
pub fn keystore_entry(private_key: &str) -> String {
    let trimmed = private_key.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    match hex::decode(hex_part) {
        Ok(secret) if secret.len() == 32 => {
            let mut bytes = Vec::with_capacity(33);
            bytes.push(ED25519_FLAG);
            bytes.extend_from_slice(&secret);
            STANDARD.encode(bytes)
        }
        _ => trimmed.to_string(),
    }
}

/// File contents: a JSON array holding one entry, or the material verbatim
/// when it already is a keystore array.
pub fn keystore_contents(credentials: &Credentials) -> String {
    let key = credentials.expose().trim();
    if key.starts_with('[') {
        return key.to_string();
    }
    serde_json::Value::from(vec![keystore_entry(key)]).to_string()
}

/// A key file that is deleted when dropped.
pub struct KeyFile {
    file: NamedTempFile,
}

impl KeyFile {
    /// Write `credentials` to a new owner-only file in `scratch_dir`.
    pub fn write(scratch_dir: &Path, credentials: &Credentials) -> Result<Self, ToolchainError> {
        let credential_err = |e: std::io::Error| ToolchainError::Credential(e.to_string());

        std::fs::create_dir_all(scratch_dir).map_err(credential_err)?;
        let mut file = tempfile::Builder::new()
            .prefix("suiforge-key-")
            .suffix(".json")
            .tempfile_in(scratch_dir)
            .map_err(credential_err)?;

        file.write_all(keystore_contents(credentials).as_bytes())
            .map_err(credential_err)?;
        file.as_file().sync_all().map_err(credential_err)?;

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_secret_becomes_flagged_base64() {
        let secret = [7u8; 32];
        let entry = keystore_entry(&format!("0x{}", hex::encode(secret)));

        let decoded = STANDARD.decode(&entry).unwrap();
        assert_eq!(decoded.len(), 33);
        assert_eq!(decoded[0], ED25519_FLAG);
        assert_eq!(&decoded[1..], &secret);
        assert_eq!(entry, keystore_entry(&hex::encode(secret)));
    }

    #[test]
    fn other_forms_pass_through() {
        assert_eq!(keystore_entry("suiprivkey1qqexample"), "suiprivkey1qqexample");
        assert_eq!(keystore_entry("abcd"), "abcd");
    }

    #[test]
    fn contents_wrap_single_entry() {
        let contents = keystore_contents(&Credentials::new("AAAA"));
        assert_eq!(contents, r#"["AAAA"]"#);

        let verbatim = keystore_contents(&Credentials::new(r#"["AAAA","BBBB"]"#));
        assert_eq!(verbatim, r#"["AAAA","BBBB"]"#);
    }

    #[test]
    fn key_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = KeyFile::write(dir.path(), &Credentials::new("AAAA")).unwrap();
        let path = key_file.path().to_path_buf();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"["AAAA"]"#);
        drop(key_file);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let key_file = KeyFile::write(dir.path(), &Credentials::new("AAAA")).unwrap();
        let mode = std::fs::metadata(key_file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
