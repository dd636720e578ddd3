pub mod bonus_unlock;
pub mod checkin;
pub mod fragments;
pub mod game;
pub mod lottery;
pub mod task_ctx;
pub mod task_flow;

pub use task_ctx::TaskCtx;
pub use task_flow::{BenefitTask, TaskFlow};
