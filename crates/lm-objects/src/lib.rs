//! Embedded objects: images, text boxes and tables.
//!
//! Each object is an element carrying `data-role`; its presentation is
//! derived from `data-*` attributes so it can be rewritten for a new theme.
//! [`ObjectController`] owns the single active object, its overlay handles
//! and the pointer and keyboard gestures acting on it.

mod common;
mod config;
mod controller;
mod image;
mod object;
mod state;
mod table;
mod text_box;

pub use common::BorderInfo;
pub use common::BorderUpdate;
pub use common::LayoutMode;
pub use config::MarginUpdate;
pub use config::Margins;
pub use config::ObjectConfig;
pub use controller::KeyOutcome;
pub use controller::ObjectController;
pub use controller::ObjectEvent;
pub use controller::ObjectInfo;
pub use controller::PointerOutcome;
pub use image::IMAGE_WRAPPER_CLASS;
pub use image::ImageObject;
pub use image::ImageSpec;
pub use object::AnyObject;
pub use object::ColorEffect;
pub use object::ObjectContext;
pub use object::ObjectProperty;
pub use object::SelectableObject;
pub use state::InteractionState;
pub use table::BorderLine;
pub use table::BorderLines;
pub use table::ColumnPosition;
pub use table::MAX_TABLE_BORDER_PX;
pub use table::MAX_TABLE_DIMENSION;
pub use table::RowPosition;
pub use table::TableBorderInfo;
pub use table::TableColorTarget;
pub use table::TableColors;
pub use table::TableObject;
pub use table::TableSpec;
pub use table::TableWidth;
pub use table::enclosing_cell;
pub use table::is_cell;
pub use table::owning_table;
pub use text_box::TEXT_BOX_CLASS;
pub use text_box::TEXT_BOX_CONTENT_CLASS;
pub use text_box::TextBoxObject;
