// Test modules for faq-pipeline crate
//
// Each source file has a corresponding test module focused on its observable
// behavior; shared fixtures and collaborator fakes live in helpers.

pub mod helpers;

pub mod retry;
pub mod scoring;
