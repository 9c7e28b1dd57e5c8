mod degree_celsius;
mod kilowatt;
mod spot_price;

pub use degree_celsius::DegreeCelsius;
pub use kilowatt::KiloWatt;
pub use spot_price::SpotPrice;
