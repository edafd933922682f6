pub mod quadrant;
pub mod theme;
