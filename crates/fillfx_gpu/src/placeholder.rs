//! Built-in placeholder image shown when nothing is selected.

/// Edge length of the placeholder in pixels.
pub const PLACEHOLDER_SIZE: u32 = 64;
/// Edge length of one checker cell.
const CELL: u32 = 8;

const LIGHT: [u8; 4] = [0xE8, 0xE8, 0xEC, 0xFF];
const DARK: [u8; 4] = [0xB4, 0xB4, 0xBE, 0xFF];

/// RGBA8 checkerboard, `PLACEHOLDER_SIZE` square.
pub fn placeholder_rgba() -> Vec<u8> {
    checkerboard(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, CELL)
}

/// RGBA8 checkerboard of the given size; `cell` is clamped to at least 1.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> Vec<u8> {
    let cell = cell.max(1);
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let color = if (x / cell + y / cell) % 2 == 0 { LIGHT } else { DARK };
            data.extend_from_slice(&color);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_packed_rgba() {
        let data = placeholder_rgba();
        assert_eq!(data.len(), (PLACEHOLDER_SIZE * PLACEHOLDER_SIZE * 4) as usize);
    }

    #[test]
    fn test_checkerboard_alternates_cells() {
        let data = checkerboard(4, 1, 2);
        assert_eq!(&data[0..4], &LIGHT);
        assert_eq!(&data[4..8], &LIGHT);
        assert_eq!(&data[8..12], &DARK);
        assert_eq!(&data[12..16], &DARK);
    }
}
