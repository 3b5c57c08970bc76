mod lifecycle_tests;
mod rewards_tests;
