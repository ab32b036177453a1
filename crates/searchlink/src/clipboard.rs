//! System clipboard.

use crate::error::CliError;

/// Replace the clipboard contents with `text`.
pub(crate) fn copy(text: &str) -> Result<(), CliError> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text)?;
    Ok(())
}
