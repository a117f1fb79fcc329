pub mod messages;
pub mod summary_view;
