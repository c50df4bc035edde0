mod common;
mod harvest_tests;
mod orchestrate_tests;
