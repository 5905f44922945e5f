use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::RngCore;
use tracing::info;

const GENERATED_LEN: usize = 32;

/// Shortest configured secret accepted for signing session tokens.
pub const MIN_SECRET_LEN: usize = 16;

/// Fresh random signing key.
pub fn random_secret() -> Vec<u8> {
    let mut key = vec![0u8; GENERATED_LEN];
    rand::rng().fill_bytes(&mut key);
    key
}

/// Session signing key kept next to the session file.
///
/// The first call generates a random key and writes it hex-encoded to `path`
/// (owner-only on unix); later calls read it back, so tokens survive restarts.
pub fn load_or_create_secret(path: &Path) -> Result<Vec<u8>> {
    match std::fs::read_to_string(path) {
        Ok(raw) => return decode(path, &raw),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let key = random_secret();
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    match options.open(path) {
        Ok(mut file) => {
            file.write_all(hex::encode(&key).as_bytes())
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "Generated session signing secret");
            Ok(key)
        }
        // Another process created it first.
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            decode(path, &raw)
        }
        Err(e) => Err(e).with_context(|| format!("creating {}", path.display())),
    }
}

fn decode(path: &Path, raw: &str) -> Result<Vec<u8>> {
    let key = hex::decode(raw.trim())
        .with_context(|| format!("{} is not a hex-encoded secret", path.display()))?;
    if key.len() < MIN_SECRET_LEN {
        bail!(
            "{} holds a {}-byte secret; at least {MIN_SECRET_LEN} bytes are required",
            path.display(),
            key.len()
        );
    }
    Ok(key)
}
