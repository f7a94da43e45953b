#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use filetime::FileTime;
use zip::write::SimpleFileOptions;

pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// `(name, contents, unix mode)`; a name ending in `/` is a directory.
pub type Entry = (&'static str, &'static [u8], u32);

pub fn zip_archive(dir: &Path, name: &str, entries: &[Entry]) -> PathBuf {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (entry, bytes, mode) in entries {
        if entry.ends_with('/') {
            writer.add_directory(*entry, SimpleFileOptions::default()).unwrap();
        } else {
            writer
                .start_file(*entry, SimpleFileOptions::default().unix_permissions(*mode))
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
    }
    let path = dir.join(name);
    std::fs::write(&path, writer.finish().unwrap().into_inner()).unwrap();
    path
}

pub fn tar_gz_archive(dir: &Path, name: &str, entries: &[Entry]) -> PathBuf {
    let gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    let mut builder = tar::Builder::new(gz);
    for (entry, bytes, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_mode(*mode);
        header.set_size(bytes.len() as u64);
        header.set_entry_type(if entry.ends_with('/') {
            tar::EntryType::Directory
        } else {
            tar::EntryType::Regular
        });
        builder.append_data(&mut header, entry, *bytes).unwrap();
    }
    let bytes = builder.into_inner().unwrap().finish().unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// `lib/readme.txt` (10 bytes) and an executable `lib/bin/tool`.
pub fn tool_zip(dir: &Path) -> PathBuf {
    zip_archive(
        dir,
        "tool.zip",
        &[
            ("lib/", b"", 0o755),
            ("lib/readme.txt", b"0123456789", 0o644),
            ("lib/bin/", b"", 0o755),
            ("lib/bin/tool", b"#!/bin/sh\n", 0o755),
        ],
    )
}

pub fn backdate(path: &Path, by: Duration) {
    let when = FileTime::from_system_time(SystemTime::now() - by);
    filetime::set_symlink_file_times(path, when, when).unwrap();
}

pub fn names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
