//! YAML persistence helpers.

use serde::{de::DeserializeOwned, Serialize};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::{ConfigError, Result};

/// Reads and deserializes a YAML document.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serializes a document completely before touching the file.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_yaml::to_string(value)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| ConfigError::io(parent, err))?;
    }
    fs::write(path, content).map_err(|err| ConfigError::io(path, err))?;
    tracing::debug!(target: "cattle", path = %path.display(), "yaml document written");
    Ok(())
}

/// [`save`] for documents holding secrets.
pub fn save_private<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_yaml::to_string(value)?;
    write_private(path, content.as_bytes())
}

/// Writes `contents` to a file only its owner can read. On unix the mode is
/// fixed before the first byte is written, also when the file existed.
pub fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| ConfigError::io(parent, err))?;
    }
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(|err| ConfigError::io(path, err))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|err| ConfigError::io(path, err))?;
    }
    file.write_all(contents)
        .and_then(|_| file.sync_all())
        .map_err(|err| ConfigError::io(path, err))?;
    tracing::debug!(target: "cattle", path = %path.display(), "private file written");
    Ok(())
}

/// Merges `overlay` into `base`. Mappings merge key by key, anything else
/// in the overlay replaces the base value. Null overlay values are ignored.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Removes every `privateKey`/`*PrivateKey` entry, recursively.
pub fn strip_private_keys(value: &mut Value) {
    match value {
        Value::Mapping(map) => {
            let doomed: Vec<Value> = map
                .keys()
                .filter(|key| key.as_str().map_or(false, is_private_key_field))
                .cloned()
                .collect();
            for key in doomed {
                map.remove(&key);
            }
            for (_, nested) in map.iter_mut() {
                strip_private_keys(nested);
            }
        }
        Value::Sequence(items) => items.iter_mut().for_each(strip_private_keys),
        _ => {}
    }
}

fn is_private_key_field(name: &str) -> bool {
    name == "privateKey" || name.ends_with("PrivateKey")
}

/// Builds a mapping value from `(key, value)` pairs.
pub fn mapping<I, K>(entries: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    let mut map = Mapping::new();
    for (key, value) in entries {
        map.insert(Value::String(key.into()), value);
    }
    Value::Mapping(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn deep_merge_combines_nested_mappings() {
        let mut base = parse("a: 1\nnested:\n  x: 1\n  y: 2\nlist: [1, 2]\n");
        deep_merge(&mut base, parse("nested:\n  y: 3\n  z: 4\nlist: [9]\nb: true\n"));
        assert_eq!(
            base,
            parse("a: 1\nnested:\n  x: 1\n  y: 3\n  z: 4\nlist: [9]\nb: true\n")
        );
    }

    #[test]
    fn null_overlay_keeps_base() {
        let mut base = parse("a: 1\n");
        deep_merge(&mut base, Value::Null);
        assert_eq!(base, parse("a: 1\n"));
    }

    #[test]
    fn strips_nested_private_keys() {
        let mut value = parse(
            "privateKey: A\nnodes:\n  - mainPrivateKey: B\n    name: n1\nkeep: C\n",
        );
        strip_private_keys(&mut value);
        assert_eq!(value, parse("nodes:\n  - name: n1\nkeep: C\n"));
    }

    #[test]
    fn save_then_load_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("deep").join("doc.yml");
        save(&path, &parse("hello: world\n")).unwrap();
        let loaded: Value = load(&path).unwrap();
        assert_eq!(loaded, parse("hello: world\n"));
    }

    #[test]
    fn load_missing_file_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let result: Result<Value> = load(&dir.path().join("missing.yml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn private_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("secrets").join("request.yml");
        save_private(&path, &parse("privateKey: AA\n")).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        // an existing world-readable file is tightened before it is rewritten
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        write_private(&path, b"secret").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert_eq!(fs::read(&path).unwrap(), b"secret");
    }
}
