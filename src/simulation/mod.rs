pub mod perception;
pub mod routines;
pub mod tick;
