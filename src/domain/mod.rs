pub mod cell;
pub mod entity;
pub mod maze;
pub mod power;
pub mod rules;
