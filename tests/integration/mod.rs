pub mod history;
pub mod music_project;
