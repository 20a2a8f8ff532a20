pub mod api;
pub mod faq;
pub mod models;
pub mod progress;
pub mod roadmap;
