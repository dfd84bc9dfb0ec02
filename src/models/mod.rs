pub mod budget;
pub mod estimate;
pub mod item;
pub mod room;
pub mod room_template;
pub mod rules;
pub mod user;
