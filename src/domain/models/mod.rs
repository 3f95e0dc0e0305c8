pub mod booking;
pub mod booking_link;
pub mod customer;
pub mod payment;
pub mod schedule;
pub mod service;
pub mod tenant;
pub mod time_range;
pub mod webhook_event;
