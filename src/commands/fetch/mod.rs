mod acquire;
mod place;
mod run;

pub use run::run;
