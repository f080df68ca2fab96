use image::ImageFormat;

/// A decoded raster image, RGBA with 8 bits per channel.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub width: u32,
    pub height: u32,
    /// Container format the image was decoded from.
    pub format: ImageFormat,
    pub pixels: Vec<u8>,
}

impl ImageAsset {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let pixel = self.pixels.get(offset..offset + 4)?;
        pixel.try_into().ok()
    }
}
