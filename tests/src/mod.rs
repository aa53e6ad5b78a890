#[cfg(test)]
pub mod storefront_tests;
#[cfg(test)]
pub mod utils;
