pub mod apply;
pub mod rewrite;
pub mod ship;
