pub mod action;
pub mod event;
pub mod message;
pub mod notification;
pub mod retry;
pub mod template;
