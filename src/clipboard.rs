// src/clipboard.rs
// =============================================================================
// Best-effort clipboard copy for clone commands.
//
// When no clipboard is available (headless session, SSH) the failure is
// logged at debug level and otherwise ignored.
// =============================================================================

use tracing::debug;

/// Copies `text`; returns whether it worked.
pub fn copy(text: &str) -> bool {
    match try_copy(text) {
        Ok(()) => true,
        Err(e) => {
            debug!("Clipboard copy failed: {e}");
            false
        }
    }
}

fn try_copy(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text)
}
