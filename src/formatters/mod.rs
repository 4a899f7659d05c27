pub mod dot;
pub mod json_compact;
pub mod records;
pub mod text;

pub use dot::DotFormatter;
pub use json_compact::JsonCompactFormatter;
pub use records::RecordsFormatter;
pub use text::TextFormatter;
