pub mod bindable;
pub mod filter_into_join;
