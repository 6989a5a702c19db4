// tabweave services
// Time source for idle accounting and the persisted settings store.

pub mod clock;
pub mod settings_engine;
