pub mod csv_log;
pub mod pellet_stove;
pub mod sensibo;
pub mod smhi;
pub mod status;
pub mod tibber;
