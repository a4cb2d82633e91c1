pub mod called_on;
pub mod classes;
pub mod core;
pub mod roster;
pub mod seating;
