//! Video frame representation

/// Decoded video frame, packed RGB24
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Raw pixel data, row-major
    pub data: Vec<u8>,
    /// Timestamp in milliseconds
    pub timestamp: u64,
    /// Sequence number within the stream
    pub sequence: u64,
}

impl VideoFrame {
    /// Bytes per pixel implied by the buffer size, if consistent
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        let pixels = self.width as usize * self.height as usize;
        if pixels == 0 || self.data.len() % pixels != 0 {
            return None;
        }
        Some(self.data.len() / pixels)
    }

    /// Flip the frame left-to-right in place.
    ///
    /// Returns `false` and leaves the data untouched when the buffer size does not
    /// match the dimensions.
    pub fn mirror_horizontal(&mut self) -> bool {
        let Some(bpp) = self.bytes_per_pixel() else {
            return false;
        };

        let row_len = self.width as usize * bpp;
        for row in self.data.chunks_exact_mut(row_len) {
            let width = self.width as usize;
            for x in 0..width / 2 {
                let left = x * bpp;
                let right = (width - 1 - x) * bpp;
                for b in 0..bpp {
                    row.swap(left + b, right + b);
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, data: Vec<u8>) -> VideoFrame {
        VideoFrame {
            width,
            height,
            data,
            timestamp: 0,
            sequence: 0,
        }
    }

    #[test]
    fn test_mirror_swaps_pixels_per_row() {
        // 3x2 RGB frame
        let mut f = frame(
            3,
            2,
            vec![
                1, 1, 1, 2, 2, 2, 3, 3, 3, //
                4, 4, 4, 5, 5, 5, 6, 6, 6,
            ],
        );
        assert!(f.mirror_horizontal());
        assert_eq!(
            f.data,
            vec![
                3, 3, 3, 2, 2, 2, 1, 1, 1, //
                6, 6, 6, 5, 5, 5, 4, 4, 4,
            ]
        );
    }

    #[test]
    fn test_mirror_rejects_inconsistent_buffer() {
        let mut f = frame(2, 2, vec![0; 7]);
        assert!(!f.mirror_horizontal());
        assert_eq!(f.data, vec![0; 7]);
    }
}
