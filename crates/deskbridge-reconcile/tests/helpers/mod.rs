pub mod fake_billing;
pub mod fake_directory;
