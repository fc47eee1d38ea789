pub mod fuzz_utils;
pub mod fuzzed_data_provider;
