#[path = "e2e/link_scenarios.rs"]
mod link_scenarios;

#[path = "e2e/cache_round_trip.rs"]
mod cache_round_trip;

#[path = "e2e/missing_objects.rs"]
mod missing_objects;

#[path = "e2e/lifecycle.rs"]
mod lifecycle;

#[path = "e2e/deletion.rs"]
mod deletion;

#[path = "e2e/config_loading.rs"]
mod config_loading;
