pub mod tiling;

pub use tiling::tile_png;
