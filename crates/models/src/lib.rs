//! Entities of the garage backend and the field rules they carry.

pub mod errors;
pub mod db;
pub mod enums;
pub mod line_item;
pub mod user;
pub mod user_credentials;
pub mod client;
pub mod invoice;
pub mod payment;
pub mod budget;
pub mod appointment;
pub mod expense;
pub mod shipment_request;

#[cfg(test)]
mod tests;
