use crate::error::{Error, Result};

/// Normalize a raw entry name and reject anything that could leave the
/// extraction root.
///
/// Backslashes become `/`, `.` segments and a trailing `/` (directory
/// marker) are dropped. Absolute names, empty segments (`a//b`), `..`
/// segments and NUL bytes are rejected. A name made only of `.` segments
/// normalizes to the empty string, which is the extraction root itself.
pub fn normalize_entry_name(raw: &str) -> Result<String> {
    let invalid = |reason| Error::InvalidEntryName {
        name: raw.to_owned(),
        reason,
    };

    let name = raw.replace('\\', "/");
    if name.trim().is_empty() {
        return Err(invalid("name is blank"));
    }
    if name.contains('\0') {
        return Err(invalid("name contains a NUL byte"));
    }
    if name.starts_with('/') || has_drive_prefix(&name) {
        return Err(invalid("name is an absolute path"));
    }

    let name = name.trim_end_matches('/');
    if name.contains("//") {
        return Err(invalid("name contains an empty path segment"));
    }
    let segments: Vec<&str> = name.split('/').filter(|segment| *segment != ".").collect();
    if segments.contains(&"..") {
        return Err(invalid("name contains a '..' segment"));
    }
    Ok(segments.join("/"))
}

/// Resolve a symlink target against the directory holding the link.
///
/// `entry` is the link's normalized path relative to the extraction root.
/// Returns the target relative to the root, or `None` when it escapes the
/// root or points at the root itself.
pub fn resolve_link_target(entry: &str, link: &str) -> Option<String> {
    let link = link.replace('\\', "/");
    if link.is_empty() || link.starts_with('/') || has_drive_prefix(&link) {
        return None;
    }

    let mut parts: Vec<&str> = entry
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    parts.pop();
    for segment in link.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            segment => parts.push(segment),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Strip-root state across one extraction pass.
#[derive(Debug)]
pub(crate) enum RootPrefix {
    Keep,
    Pending,
    Established(String),
}

impl RootPrefix {
    pub(crate) fn new(strip_root: bool) -> Self {
        if strip_root { Self::Pending } else { Self::Keep }
    }

    /// Map a normalized name to its output name. `None` means the entry is
    /// the stripped root directory itself and produces nothing.
    pub(crate) fn strip<'n>(&mut self, name: &'n str, is_dir: bool) -> Result<Option<&'n str>> {
        if let Self::Established(prefix) = self {
            if name == prefix.as_str() && is_dir {
                return Ok(None);
            }
            return name
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .map(Some)
                .ok_or_else(|| Error::StripRootMismatch {
                    name:   name.to_owned(),
                    prefix: prefix.clone(),
                });
        }
        if matches!(self, Self::Keep) {
            return Ok(Some(name));
        }

        match name.split_once('/') {
            Some((root, rest)) => {
                *self = Self::Established(root.to_owned());
                Ok(Some(rest))
            }
            None if is_dir => {
                *self = Self::Established(name.to_owned());
                Ok(None)
            }
            None => Err(Error::StripRootNotDirectory {
                name: name.to_owned(),
            }),
        }
    }
}
