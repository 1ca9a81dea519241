pub mod cv_file;
pub mod job_application;
pub mod message;
pub mod raw;
pub mod skill;
pub mod ticket;
pub mod time_entry;
