//! Extension matching and ROM selection.

use super::catalog::Entry;

/// Extension of the containers this crate opens.
pub const CONTAINER_EXTENSION: &str = "zip";

/// Default media extensions, most preferred first.
///
/// Program, tape, disk and cartridge images understood by the loaders.
pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &[
    ".prg", ".p00", ".t64", ".tap", ".d64", ".d71", ".d81", ".x64", ".g64", ".crt", ".bin", ".rom",
];

/// Text after the last `.` of `name`, if that text is a real suffix.
///
/// A dot inside a directory component (`v1.2/readme`) is not an extension.
pub fn extension(name: &str) -> Option<&str> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.contains('/') {
        return None;
    }
    Some(ext)
}

fn same_extension(ext: &str, wanted: &str) -> bool {
    let wanted = wanted.strip_prefix('.').unwrap_or(wanted);
    ext.eq_ignore_ascii_case(wanted)
}

/// Is `name` a ZIP container?
pub fn is_container(name: &str) -> bool {
    extension(name).is_some_and(|ext| same_extension(ext, CONTAINER_EXTENSION))
}

/// Does `name` carry one of the `wanted` extensions?
///
/// Extensions may be given with or without the leading dot and are
/// compared ASCII case-insensitively.
pub fn is_wanted_media<S: AsRef<str>>(name: &str, wanted: &[S]) -> bool {
    extension(name).is_some_and(|ext| wanted.iter().any(|w| same_extension(ext, w.as_ref())))
}

/// [`is_wanted_media`] against [`DEFAULT_MEDIA_EXTENSIONS`].
pub fn is_media(name: &str) -> bool {
    is_wanted_media(name, DEFAULT_MEDIA_EXTENSIONS)
}

/// First non-directory entry, in catalog order, with a wanted extension.
///
/// Catalog order decides between several candidates, not the order of
/// the extension list.
pub fn find_media<'a, S: AsRef<str>>(
    entries: &'a [Entry],
    wanted: Option<&[S]>,
) -> Option<&'a Entry> {
    entries.iter().filter(|e| !e.is_directory()).find(|e| match wanted {
        Some(list) => is_wanted_media(e.name(), list),
        None => is_media(e.name()),
    })
}
