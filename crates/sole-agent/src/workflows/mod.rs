pub mod lettings;
