pub mod ch55x;
