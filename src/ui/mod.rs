pub mod icons;
pub mod output;
pub mod theme;

pub use icons::Icons;
pub use output::{
    dim, error, header, info, json_block, muted, project_row, section, success, summary_row, warn,
};
pub use theme::{theme, Theme};
