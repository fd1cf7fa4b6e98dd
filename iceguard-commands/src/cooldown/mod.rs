pub mod monitor;
pub mod resetconfig;
pub mod setcooldown;
pub mod setthreshold;
pub mod setwindow;
pub mod status;
pub mod toggle;

mod shared;
