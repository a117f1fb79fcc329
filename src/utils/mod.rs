pub mod colors;
pub mod logging;
pub mod path;
pub mod table;
pub mod time;
