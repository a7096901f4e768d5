pub mod health;
pub mod legacy;
pub mod media;
pub mod message;
pub mod webhook;
pub mod whatsapp;

mod upload;
