pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod import;
pub mod input;
pub mod presets;
pub mod renderer;
pub mod scene;

pub fn align_to_256(n: usize) -> usize {
    (n + 255) & !255
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_up_to_next_multiple() {
        assert_eq!(align_to_256(0), 0);
        assert_eq!(align_to_256(1), 256);
        assert_eq!(align_to_256(192), 256);
        assert_eq!(align_to_256(256), 256);
        assert_eq!(align_to_256(6400), 6400);
        assert_eq!(align_to_256(6401), 6656);
    }
}
