pub mod cache;
pub mod config;
pub mod constants;
pub mod controller;
pub mod corridor;
pub mod fields;
pub mod flowfield;
pub mod grid;
pub mod location;
pub mod query;
pub mod record;
pub mod repository;
pub mod segment;
pub mod squad;
pub mod terrain;
pub mod world;

pub use cache::{StepCache, StepContext};
pub use config::SiegeConfig;
pub use controller::{tick_campaigns, SiegeController, SiegeError, SiegeServices};
pub use grid::{Grid4, Grid8, GridError};
pub use location::Location;
pub use query::{get_campaign, resolve_rally_point, should_retreat};
pub use record::{SiegePhase, SiegeRecord};
pub use repository::{abandon_campaign, declare_campaign, CampaignRepository, MemoryRepository};
