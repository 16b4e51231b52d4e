pub mod area;
pub mod clip;
pub mod corine;
pub mod dataset;
pub mod legend;
pub mod map_view;
