//! Inline style declarations, colors and lengths.

mod border;
mod color;
mod declarations;
mod length;

pub use border::BorderSide;
pub use border::BorderStyle;
pub use border::BorderValue;
pub use color::CssColor;
pub use color::Rgba;
pub use declarations::StyleDeclarations;
pub use declarations::split_top_level;
pub use length::DEFAULT_FONT_SIZE_PT;
pub use length::font_size_to_pt;
pub use length::format_px;
pub use length::legacy_size_to_pt;
pub use length::parse_px;
pub use length::pt_to_legacy_size;
pub use length::px_to_pt;
