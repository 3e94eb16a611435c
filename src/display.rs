use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::state::FrameBuffer;

/// Turn every pixel off
pub fn clear(frame: &mut FrameBuffer) {
    *frame = [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
}

/// XORs a sprite onto the FrameBuffer with its top left corner at x, y.
///
/// Each byte of `sprite` is one 8 pixel row, most significant bit leftmost.
/// Coordinates wrap on both axes so a sprite hanging off an edge reappears
/// on the opposite side.
///
/// Returns whether any lit pixel was turned off (a collision).
pub fn draw(frame: &mut FrameBuffer, x: u8, y: u8, sprite: &[u8]) -> bool {
    let mut collision = false;

    for (row, byte) in sprite.iter().enumerate() {
        let py = (y as usize + row) % DISPLAY_HEIGHT;
        for bit in 0..8 {
            if (byte >> (7 - bit)) & 1 == 0 {
                continue;
            }
            let px = (x as usize + bit) % DISPLAY_WIDTH;
            let pixel = &mut frame[py][px];
            collision |= *pixel == 1;
            *pixel ^= 1;
        }
    }

    collision
}

/// Renders the FrameBuffer as text, one line per row; handy when debugging ROMs
pub fn to_ascii(frame: &FrameBuffer) -> String {
    frame
        .iter()
        .map(|row| {
            row.iter()
                .map(|&pixel| if pixel == 1 { '#' } else { '.' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SPRITE_SHEET;

    fn blank() -> FrameBuffer {
        [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT]
    }

    #[test]
    fn test_draw_zero_glyph() {
        let mut frame = blank();
        let collision = draw(&mut frame, 1, 1, &SPRITE_SHEET[0..5]);
        let mut expected = blank();
        expected[1][1..5].copy_from_slice(&[1, 1, 1, 1]);
        expected[2][1..5].copy_from_slice(&[1, 0, 0, 1]);
        expected[3][1..5].copy_from_slice(&[1, 0, 0, 1]);
        expected[4][1..5].copy_from_slice(&[1, 0, 0, 1]);
        expected[5][1..5].copy_from_slice(&[1, 1, 1, 1]);
        assert!(!collision);
        assert_eq!(frame, expected);
    }

    #[test]
    fn test_draw_twice_erases_and_collides() {
        let mut frame = blank();
        assert!(!draw(&mut frame, 0, 0, &SPRITE_SHEET[0..5]));
        assert!(draw(&mut frame, 0, 0, &SPRITE_SHEET[0..5]));
        assert_eq!(frame, blank());
    }

    #[test]
    fn test_draw_xors() {
        let mut frame = blank();
        // 0 1 0 1 -> Set
        frame[0][0..4].copy_from_slice(&[0, 1, 0, 1]);
        // 1 1 0 0 -> Draw xor
        let collision = draw(&mut frame, 0, 0, &[0b1100_0000]);
        assert_eq!(frame[0][0..4], [1, 0, 0, 1]);
        assert!(collision);
    }

    #[test]
    fn test_unset_sprite_bits_never_collide() {
        let mut frame = blank();
        frame[0][1] = 1;
        let collision = draw(&mut frame, 0, 0, &[0b1000_0000]);
        assert!(!collision);
        assert_eq!(frame[0][1], 1);
    }

    #[test]
    fn test_draw_wraps_horizontally() {
        let mut frame = blank();
        draw(&mut frame, 62, 0, &[0xFF]);
        assert_eq!(frame[0][62..64], [1, 1]);
        assert_eq!(frame[0][0..6], [1, 1, 1, 1, 1, 1]);
        assert_eq!(frame[0][6], 0);
    }

    #[test]
    fn test_draw_wraps_vertically() {
        let mut frame = blank();
        draw(&mut frame, 0, 31, &[0x80, 0x80, 0x80]);
        assert_eq!(frame[31][0], 1);
        assert_eq!(frame[0][0], 1);
        assert_eq!(frame[1][0], 1);
        assert_eq!(frame[2][0], 0);
    }

    #[test]
    fn test_draw_wraps_coordinates_past_the_edge() {
        let mut frame = blank();
        // 70 % 64 = 6, 40 % 32 = 8
        draw(&mut frame, 70, 40, &[0x80]);
        assert_eq!(frame[8][6], 1);
    }

    #[test]
    fn test_bottom_right_pixel() {
        let mut frame = blank();
        draw(&mut frame, 63, 31, &[0x80]);
        assert_eq!(frame[31][63], 1);
    }

    #[test]
    fn test_clear() {
        let mut frame = blank();
        frame[3][7] = 1;
        frame[31][63] = 1;
        clear(&mut frame);
        assert_eq!(frame, blank());
    }

    #[test]
    fn test_to_ascii() {
        let mut frame = blank();
        frame[0][0] = 1;
        frame[1][63] = 1;
        let text = to_ascii(&frame);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), DISPLAY_HEIGHT);
        assert!(lines[0].starts_with("#."));
        assert!(lines[1].ends_with(".#"));
    }
}
