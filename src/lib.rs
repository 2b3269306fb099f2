//! Production cost, simple profit and cumulative profit for items of a crafting economy.

pub mod domain;
pub mod infra;
pub mod util;
