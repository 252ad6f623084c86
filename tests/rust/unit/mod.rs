//! Unit tests - public API checks that need no remote services

mod colour_scale_tests;
mod query_recipe_tests;
mod tier_selection_tests;
