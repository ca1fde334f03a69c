// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use super::error::ConfigError;
use crate::sample::SampleId;

/// The samples a saved session refers to.
#[derive(Deserialize, Clone, Debug)]
pub struct Session {
    /// Sample id to audio file. Relative files are resolved against the
    /// directory holding the session file.
    #[serde(default)]
    samples: BTreeMap<String, String>,

    /// Number of decode threads. Defaults to one per CPU.
    decode_threads: Option<usize>,

    #[serde(skip)]
    base_path: PathBuf,
}

impl Session {
    /// Parse a session from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Session, ConfigError> {
        let mut session = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Session>()?;
        if session.samples.is_empty() {
            return Err(ConfigError::Empty);
        }
        session.base_path = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(session)
    }

    pub fn decode_threads(&self) -> Option<usize> {
        self.decode_threads
    }

    /// Gets every sample with its resolved file path.
    pub fn entries(&self) -> Vec<(SampleId, PathBuf)> {
        self.samples
            .iter()
            .map(|(id, file)| {
                let full_path = if Path::new(file).is_absolute() {
                    PathBuf::from(file)
                } else {
                    self.base_path.join(file)
                };
                (SampleId::new(id.as_str()), full_path)
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use config::{Config, File, FileFormat};

    use super::*;

    #[test]
    fn test_session_deserialize() {
        let yaml = r#"
            samples:
              kick: drums/kick.flac
              pad: /library/pad.wav
            decode_threads: 2
        "#;

        let session: Session = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(session.decode_threads(), Some(2));
        let entries = session.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, SampleId::new("kick"));
        assert_eq!(entries[0].1, PathBuf::from("drums/kick.flac"));
        assert_eq!(entries[1].1, PathBuf::from("/library/pad.wav"));
    }

    #[test]
    fn test_session_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.yaml");
        std::fs::write(
            &path,
            "samples:\n  kick: drums/kick.flac\n  snare: /abs/snare.wav\n",
        )
        .unwrap();

        let session = Session::deserialize(&path).unwrap();
        assert_eq!(session.decode_threads(), None);
        let entries = session.entries();
        assert_eq!(entries[0].1, dir.path().join("drums/kick.flac"));
        assert_eq!(entries[1].1, PathBuf::from("/abs/snare.wav"));
    }

    #[test]
    fn test_session_without_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "samples: {}\n").unwrap();
        assert!(matches!(
            Session::deserialize(&path),
            Err(ConfigError::Empty)
        ));
    }

    #[test]
    fn test_session_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Session::deserialize(&dir.path().join("nope.yaml")),
            Err(ConfigError::Load(_))
        ));
    }
}
