mod dashboard;
mod districts;
mod etl;
mod geolocation;
mod health;
mod map;

pub use dashboard::{district_dashboard, state_dashboard};
pub use districts::list_districts;
pub use etl::trigger_etl;
pub use geolocation::locate_district;
pub use health::health_check;
pub use map::map_districts;
