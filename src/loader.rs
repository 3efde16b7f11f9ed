use std::fs;
use std::path::Path;

use crate::chip8::{Chip8, MAX_IMAGE_SIZE};
use crate::error::LoadError;

/// Read a raw program image from disk, rejecting anything that can't fit.
pub fn read_image(path: impl AsRef<Path>) -> Result<Vec<u8>, LoadError> {
    let path = path.as_ref();
    let image = fs::read(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if image.len() > MAX_IMAGE_SIZE {
        return Err(LoadError::TooLarge {
            size: image.len(),
            max: MAX_IMAGE_SIZE,
        });
    }
    Ok(image)
}

pub fn load_file(chip8: &mut Chip8, path: impl AsRef<Path>) -> Result<(), LoadError> {
    let path = path.as_ref();
    let image = read_image(path)?;
    chip8.load_image(&image)?;
    log::info!("loaded {}", path.display());
    Ok(())
}
