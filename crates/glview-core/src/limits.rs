//! Upload acceptance rules

/// Extension accepted by the viewer, compared case-insensitively.
pub const ACCEPTED_EXTENSION: &str = "glb";

/// Largest accepted upload: 50 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Check a file name for the `.glb` extension. Only the name is inspected.
pub fn has_accepted_extension(name: &str) -> bool {
    let suffix_len = ACCEPTED_EXTENSION.len() + 1;
    if name.len() < suffix_len || !name.is_char_boundary(name.len() - suffix_len) {
        return false;
    }
    let (_, suffix) = name.split_at(name.len() - suffix_len);
    suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(ACCEPTED_EXTENSION)
}

/// Human-readable byte count ("12.4 MB").
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}
