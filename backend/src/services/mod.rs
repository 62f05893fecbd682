pub mod auth;
pub mod completions;
pub mod extra_completions;
pub mod groups;
pub mod houses;
pub mod rotation;
pub mod scores;
pub mod swaps;
pub mod tasks;
pub mod week_end;
pub mod weeks;

#[cfg(test)]
pub mod testing;
