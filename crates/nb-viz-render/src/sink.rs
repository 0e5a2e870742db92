use std::path::Path;

use nb_core::ImageSink;

/// Writes images to the filesystem. The parent directory must exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSink;

impl ImageSink for FileSink {
    fn save_image(&mut self, image: &[u8], path: &Path) -> nb_core::Result<()> {
        std::fs::write(path, image)?;
        Ok(())
    }
}
