//! Attachment validation.

use crate::types::AttachmentRef;

/// Extensions accepted for relay, lowercase.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "epub"];

/// Size ceiling in bytes.
///
/// This is 30 * 4000 * 4000, about 457 MiB, even though it is announced to
/// senders as a megabyte figure. The literal value is the enforced limit.
pub const MAX_ATTACHMENT_SIZE: u64 = 30 * 4000 * 4000;

/// Return whether an attachment may be relayed.
pub fn validate(attachment: &AttachmentRef) -> bool {
    let ext = extension(&attachment.filename);
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return false;
    }
    attachment.size <= MAX_ATTACHMENT_SIZE
}

/// Lowercased text after the last `.`; the whole name if there is no dot.
pub fn extension(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or(filename)
        .to_lowercase()
}

/// The size ceiling expressed in MiB, as shown to senders.
pub fn max_size_mib() -> f64 {
    MAX_ATTACHMENT_SIZE as f64 / 1024.0 / 1024.0
}
