//! The sound catalog: which files in the sounds directory can be put on a pad.
//!
//! [`server`] exposes the listing and the files themselves over HTTP,
//! [`client`] is what the front end uses to read them back.

pub mod client;
pub mod server;

use std::io;
use std::path::Path;

pub const SOUND_EXTENSIONS: [&str; 2] = [".wav", ".mp3"];

pub fn is_sound_file(name: &str) -> bool {
    SOUND_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Names of the audio files directly under `dir`, in directory order.
pub fn list_sounds(dir: &Path) -> io::Result<Vec<String>> {
    let mut sounds = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        // non-utf8 names can't be put in a json listing anyway
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if is_sound_file(&name) {
            sounds.push(name);
        }
    }
    Ok(sounds)
}
