//! CLI commands

mod completions;
mod doctor;
mod inspect;
mod run;

pub use completions::CompletionsCommand;
pub use doctor::DoctorCommand;
pub use inspect::InspectCommand;
pub use run::RunCommand;
