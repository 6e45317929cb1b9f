use std::fs::OpenOptions;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No such file or directory -- {0} (LoadError)")]
    NotFound(String),
    #[error("Couldn't read {0}: {1} (LoadError)")]
    CouldntOpen(String, String),
}

/// Read a script file. A name without an extension gets `.rb` appended
/// when the bare name does not exist.
pub fn load_file(file_name: &str) -> Result<(PathBuf, String), LoadError> {
    let path = Path::new(file_name);
    let path = if path.extension().is_none() && !path.exists() {
        path.with_extension("rb")
    } else {
        path.to_path_buf()
    };
    let absolute_path = path
        .canonicalize()
        .map_err(|_| LoadError::NotFound(file_name.to_string()))?;
    let mut file_body = String::new();
    OpenOptions::new()
        .read(true)
        .open(&absolute_path)
        .and_then(|mut file| file.read_to_string(&mut file_body))
        .map_err(|ioerr| LoadError::CouldntOpen(file_name.to_string(), ioerr.to_string()))?;
    Ok((absolute_path, file_body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file() {
        match load_file("no/such/script") {
            Err(LoadError::NotFound(name)) => assert_eq!("no/such/script", name),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn load_script() {
        let path = std::env::temp_dir().join("rubytree_loader_test.rb");
        std::fs::write(&path, "puts 1\n").unwrap();
        let (absolute_path, body) = load_file(path.to_str().unwrap()).unwrap();
        assert!(absolute_path.is_absolute());
        assert_eq!("puts 1\n", body);
        let _ = std::fs::remove_file(&path);
    }
}
