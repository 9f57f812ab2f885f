use crate::domain::errors::CombinerError;
#[cfg(feature = "clipboard-support")]
use log::{debug, info, warn};

pub trait Clipboard {
    fn read_text(&mut self) -> Result<String, CombinerError>;
    fn write_text(&mut self, text: &str) -> Result<(), CombinerError>;
}

/// The desktop clipboard. A fresh provider is opened per call.
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(feature = "clipboard-support")]
impl Clipboard for SystemClipboard {
    fn read_text(&mut self) -> Result<String, CombinerError> {
        use clipboard::{ClipboardContext, ClipboardProvider};

        debug!("Reading text from clipboard");
        let mut ctx: ClipboardContext = ClipboardProvider::new().map_err(|e| {
            warn!("Failed to access clipboard: {}", e);
            CombinerError::ClipboardUnavailable(e.to_string())
        })?;
        ctx.get_contents()
            .map_err(|e| CombinerError::ClipboardUnavailable(e.to_string()))
    }

    fn write_text(&mut self, text: &str) -> Result<(), CombinerError> {
        use clipboard::{ClipboardContext, ClipboardProvider};

        debug!("Writing {} bytes to clipboard", text.len());
        let mut ctx: ClipboardContext = ClipboardProvider::new().map_err(|e| {
            warn!("Failed to access clipboard: {}", e);
            CombinerError::ClipboardUnavailable(e.to_string())
        })?;
        ctx.set_contents(text.to_owned()).map_err(|e| {
            warn!("Failed to copy to clipboard: {}", e);
            CombinerError::ClipboardUnavailable(e.to_string())
        })?;
        info!("Copied to clipboard (size: {} bytes)", text.len());
        Ok(())
    }
}

#[cfg(not(feature = "clipboard-support"))]
impl Clipboard for SystemClipboard {
    fn read_text(&mut self) -> Result<String, CombinerError> {
        Err(CombinerError::ClipboardUnavailable(
            "built without clipboard support".to_string(),
        ))
    }

    fn write_text(&mut self, _text: &str) -> Result<(), CombinerError> {
        Err(CombinerError::ClipboardUnavailable(
            "built without clipboard support".to_string(),
        ))
    }
}
